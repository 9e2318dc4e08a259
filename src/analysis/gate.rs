//! Silence gate
//!
//! Dead air is not classifiable. When the mean frame RMS of a clip falls
//! below the policy threshold the pipeline answers with the policy's
//! default label at zero confidence and never touches the backend.

use serde::{Deserialize, Serialize};

use crate::classify::VoiceLabel;
use crate::engine::calculate_rms;
use crate::error::{DetectorError, Result};

/// RMS threshold on a [-1, 1] amplitude scale
pub const SILENCE_RMS_THRESHOLD: f32 = 0.005;

/// Explanation returned for silent clips
pub const SILENCE_EXPLANATION: &str = "Audio signal too weak or silent to analyze.";

/// Frame length for the RMS envelope
pub const RMS_FRAME_LENGTH: usize = 2048;

/// Hop between RMS frames
pub const RMS_HOP_LENGTH: usize = 512;

/// What the pipeline does with a silent clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilencePolicy {
    /// Mean RMS below this is silent
    pub rms_threshold: f32,
    /// Label reported for silent clips
    pub default_label: VoiceLabel,
    /// Fixed explanation reported for silent clips
    pub explanation: String,
}

impl Default for SilencePolicy {
    fn default() -> Self {
        Self {
            rms_threshold: SILENCE_RMS_THRESHOLD,
            default_label: VoiceLabel::Human,
            explanation: SILENCE_EXPLANATION.to_string(),
        }
    }
}

impl SilencePolicy {
    pub fn validate(&self) -> Result<()> {
        if !self.rms_threshold.is_finite() || self.rms_threshold < 0.0 {
            return Err(DetectorError::configuration(format!(
                "silence.rms_threshold must be a non-negative number, got {}",
                self.rms_threshold
            )));
        }
        if self.explanation.trim().is_empty() {
            return Err(DetectorError::configuration(
                "silence.explanation must not be empty",
            ));
        }
        Ok(())
    }
}

/// Outcome of gating one clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateReading {
    /// Mean frame RMS over the whole clip
    pub rms: f32,
    /// Whether the clip is below the threshold
    pub silent: bool,
}

/// Energy gate in front of inference
#[derive(Debug, Clone)]
pub struct SilenceGate {
    policy: SilencePolicy,
}

impl SilenceGate {
    pub fn new(policy: SilencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SilencePolicy {
        &self.policy
    }

    /// Measure a clip and compare it against the threshold
    pub fn measure(&self, samples: &[f32]) -> GateReading {
        let rms = mean_frame_rms(samples);
        GateReading {
            rms,
            // NaN energy never counts as signal
            silent: rms.is_nan() || rms < self.policy.rms_threshold,
        }
    }

    pub fn is_silent(&self, samples: &[f32]) -> bool {
        self.measure(samples).silent
    }
}

impl Default for SilenceGate {
    fn default() -> Self {
        Self::new(SilencePolicy::default())
    }
}

/// Mean of the frame-wise RMS envelope.
///
/// Clips shorter than one frame fall back to a single whole-clip RMS.
pub fn mean_frame_rms(samples: &[f32]) -> f32 {
    if samples.len() <= RMS_FRAME_LENGTH {
        return calculate_rms(samples);
    }

    let mut total = 0.0_f64;
    let mut frames = 0_usize;
    let mut start = 0;
    while start + RMS_FRAME_LENGTH <= samples.len() {
        total += calculate_rms(&samples[start..start + RMS_FRAME_LENGTH]) as f64;
        frames += 1;
        start += RMS_HOP_LENGTH;
    }

    (total / frames as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AudioSample, ANALYSIS_SAMPLE_RATE};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_clip_is_silent() {
        let gate = SilenceGate::default();
        let clip = AudioSample::silence(1.0, ANALYSIS_SAMPLE_RATE);
        let reading = gate.measure(clip.samples());
        assert!(reading.silent);
        assert_eq!(reading.rms, 0.0);
    }

    #[test]
    fn test_empty_clip_is_silent() {
        assert!(SilenceGate::default().is_silent(&[]));
    }

    #[test]
    fn test_faint_noise_is_silent() {
        let clip = AudioSample::white_noise(0.002, 1.0, ANALYSIS_SAMPLE_RATE, 1);
        assert!(SilenceGate::default().is_silent(clip.samples()));
    }

    #[test]
    fn test_speech_level_noise_passes() {
        let clip = AudioSample::white_noise(0.3, 1.0, ANALYSIS_SAMPLE_RATE, 1);
        let reading = SilenceGate::default().measure(clip.samples());
        assert!(!reading.silent);
        assert_abs_diff_eq!(reading.rms, 0.3, epsilon = 0.02);
    }

    #[test]
    fn test_nan_energy_is_silent() {
        let samples = vec![f32::NAN; 4096];
        assert!(SilenceGate::default().is_silent(&samples));
    }

    #[test]
    fn test_mean_frame_rms_matches_steady_signal() {
        let clip = AudioSample::sine_wave(1000.0, 0.5, 1.0, ANALYSIS_SAMPLE_RATE);
        assert_abs_diff_eq!(mean_frame_rms(clip.samples()), clip.rms(), epsilon = 0.01);
    }

    #[test]
    fn test_policy_validation() {
        let policy = SilencePolicy {
            rms_threshold: -1.0,
            ..SilencePolicy::default()
        };
        assert!(policy.validate().is_err());
        assert!(SilencePolicy::default().validate().is_ok());
    }
}
