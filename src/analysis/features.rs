//! Acoustic feature extraction
//!
//! Computes the descriptors the explanation rules read:
//! - Pitch variance: std-dev of a YIN f0 contour over voiced frames
//! - Spectral flatness: mean geometric/arithmetic magnitude ratio
//! - Spectral roll-off: mean frequency under 95% of spectral magnitude
//!
//! Explanations are advisory, so extraction never fails a request: any
//! numerical fault degrades to an all-zero `FeatureVector`.

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// FFT size for spectral frames
pub const FFT_SIZE: usize = 2048;

/// Hop between analysis frames
pub const HOP_LENGTH: usize = 512;

/// Lowest f0 considered vocal (C2)
pub const PITCH_FMIN_HZ: f64 = 65.0;

/// Highest f0 considered vocal (C7)
pub const PITCH_FMAX_HZ: f64 = 2093.0;

/// Fraction of spectral magnitude below the roll-off frequency
pub const ROLLOFF_PERCENT: f64 = 0.95;

/// YIN aperiodicity threshold; frames above it are unvoiced
pub const YIN_THRESHOLD: f64 = 0.1;

/// Magnitude floor for the flatness logarithm
const MAGNITUDE_FLOOR: f64 = 1e-10;

/// Acoustic descriptors of one clip
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Standard deviation of voiced f0 in Hz
    pub pitch_variance: f64,
    /// Mean spectral flatness (0 = tonal, 1 = white)
    pub spectral_flatness: f64,
    /// Mean 95% roll-off frequency in Hz
    pub spectral_rolloff: f64,
    /// Mean frame RMS as measured by the silence gate
    pub rms_energy: f64,
}

impl FeatureVector {
    pub fn zero() -> Self {
        Self::default()
    }

    fn is_finite(&self) -> bool {
        self.pitch_variance.is_finite()
            && self.spectral_flatness.is_finite()
            && self.spectral_rolloff.is_finite()
            && self.rms_energy.is_finite()
    }
}

/// Internal extraction faults. Never escapes `extract`.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("no samples to analyze")]
    EmptySignal,

    #[error("invalid sample rate: {0}Hz")]
    InvalidSampleRate(u32),

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Frame-based feature extractor
#[derive(Debug, Clone)]
pub struct SignalFeatureExtractor {
    fft_size: usize,
    hop_length: usize,
    fmin: f64,
    fmax: f64,
}

impl Default for SignalFeatureExtractor {
    fn default() -> Self {
        Self {
            fft_size: FFT_SIZE,
            hop_length: HOP_LENGTH,
            fmin: PITCH_FMIN_HZ,
            fmax: PITCH_FMAX_HZ,
        }
    }
}

impl SignalFeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract features, falling back to zeros on any numerical fault.
    ///
    /// `rms_energy` is the silence gate's reading, passed through as-is.
    pub fn extract(&self, samples: &[f32], sample_rate: u32, rms_energy: f32) -> FeatureVector {
        match self.try_extract(samples, sample_rate, rms_energy) {
            Ok(features) => features,
            Err(e) => {
                warn!("Feature extraction failed, using zero features: {}", e);
                FeatureVector::zero()
            }
        }
    }

    /// Extract features, reporting faults
    pub fn try_extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        rms_energy: f32,
    ) -> Result<FeatureVector, FeatureError> {
        if samples.is_empty() {
            return Err(FeatureError::EmptySignal);
        }
        if sample_rate == 0 {
            return Err(FeatureError::InvalidSampleRate(sample_rate));
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(FeatureError::NonFinite("input samples"));
        }

        let (spectral_flatness, spectral_rolloff) = self.spectral_shape(samples, sample_rate);
        let pitch_variance = self.pitch_variance(samples, sample_rate);

        let features = FeatureVector {
            pitch_variance,
            spectral_flatness,
            spectral_rolloff,
            rms_energy: rms_energy as f64,
        };

        if !features.is_finite() {
            return Err(FeatureError::NonFinite("feature vector"));
        }

        debug!(
            "Features: pitch_var={:.2}Hz flatness={:.4} rolloff={:.0}Hz rms={:.4}",
            features.pitch_variance,
            features.spectral_flatness,
            features.spectral_rolloff,
            features.rms_energy
        );
        Ok(features)
    }

    // ------------------------------------------------------------------------
    // Spectral shape
    // ------------------------------------------------------------------------

    /// Mean flatness and mean roll-off over Hann-windowed frames
    fn spectral_shape(&self, samples: &[f32], sample_rate: u32) -> (f64, f64) {
        let n = self.fft_size;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let window = hann_window(n);
        let bin_hz = sample_rate as f64 / n as f64;

        let mut flatness_sum = 0.0;
        let mut rolloff_sum = 0.0;
        let mut frames = 0usize;

        for frame in frames_of(samples, n, self.hop_length) {
            let mut buffer: Vec<Complex<f32>> = (0..n)
                .map(|i| {
                    let s = frame.get(i).copied().unwrap_or(0.0);
                    Complex::new(s * window[i], 0.0)
                })
                .collect();
            fft.process(&mut buffer);

            let magnitudes: Vec<f64> = buffer[..=n / 2].iter().map(|c| c.norm() as f64).collect();

            flatness_sum += spectral_flatness(&magnitudes);
            rolloff_sum += spectral_rolloff(&magnitudes, bin_hz, ROLLOFF_PERCENT);
            frames += 1;
        }

        if frames == 0 {
            return (0.0, 0.0);
        }
        (flatness_sum / frames as f64, rolloff_sum / frames as f64)
    }

    // ------------------------------------------------------------------------
    // Pitch
    // ------------------------------------------------------------------------

    /// Standard deviation of the voiced f0 contour, 0 if nothing is voiced
    fn pitch_variance(&self, samples: &[f32], sample_rate: u32) -> f64 {
        let sr = sample_rate as f64;
        let frame_length = self.fft_size;
        let tau_min = ((sr / self.fmax).floor() as usize).max(2);
        let tau_max = ((sr / self.fmin).ceil() as usize).min(frame_length / 2);

        if tau_min >= tau_max {
            return 0.0;
        }

        let contour: Vec<f64> = frames_of(samples, frame_length, self.hop_length)
            .filter(|frame| frame.len() == frame_length)
            .filter_map(|frame| yin_f0(frame, sr, tau_min, tau_max))
            .filter(|f0| f0.is_finite() && *f0 >= self.fmin && *f0 <= self.fmax)
            .collect();

        debug!("Pitch contour: {} voiced frames", contour.len());
        std_dev(&contour)
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Iterate analysis frames. A clip shorter than one frame yields itself.
fn frames_of(samples: &[f32], frame_length: usize, hop: usize) -> impl Iterator<Item = &[f32]> {
    let count = if samples.len() <= frame_length {
        1
    } else {
        (samples.len() - frame_length) / hop + 1
    };
    (0..count).map(move |i| {
        let start = i * hop;
        let end = (start + frame_length).min(samples.len());
        &samples[start..end]
    })
}

fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Ratio of geometric to arithmetic mean of a magnitude spectrum
fn spectral_flatness(magnitudes: &[f64]) -> f64 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let n = magnitudes.len() as f64;
    let log_mean = magnitudes
        .iter()
        .map(|m| m.max(MAGNITUDE_FLOOR).ln())
        .sum::<f64>()
        / n;
    let arith_mean = magnitudes.iter().map(|m| m.max(MAGNITUDE_FLOOR)).sum::<f64>() / n;
    log_mean.exp() / arith_mean
}

/// Frequency below which `percent` of the spectral magnitude lies.
///
/// Bins are weighted by linear magnitude, not power; the 6 kHz cutoff
/// rule is tuned for that weighting.
fn spectral_rolloff(magnitudes: &[f64], bin_hz: f64, percent: f64) -> f64 {
    let total: f64 = magnitudes.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let threshold = percent * total;
    let mut cumulative = 0.0;
    for (bin, m) in magnitudes.iter().enumerate() {
        cumulative += m;
        if cumulative >= threshold {
            return bin as f64 * bin_hz;
        }
    }
    (magnitudes.len() - 1) as f64 * bin_hz
}

/// YIN fundamental frequency estimate for one frame, `None` if unvoiced
fn yin_f0(frame: &[f32], sr: f64, tau_min: usize, tau_max: usize) -> Option<f64> {
    let window = frame.len() - tau_max;

    // difference function
    let mut diff = vec![0.0_f64; tau_max + 1];
    for (tau, d) in diff.iter_mut().enumerate().skip(1) {
        *d = (0..window)
            .map(|j| {
                let delta = frame[j] as f64 - frame[j + tau] as f64;
                delta * delta
            })
            .sum();
    }

    // cumulative mean normalized difference
    let mut cmnd = vec![1.0_f64; tau_max + 1];
    let mut running = 0.0;
    for tau in 1..=tau_max {
        running += diff[tau];
        cmnd[tau] = if running > 0.0 {
            diff[tau] * tau as f64 / running
        } else {
            1.0
        };
    }

    // first dip under the threshold, then walk down to its local minimum
    let mut tau = tau_min;
    while tau <= tau_max {
        if cmnd[tau] < YIN_THRESHOLD {
            while tau < tau_max && cmnd[tau + 1] < cmnd[tau] {
                tau += 1;
            }
            let refined = parabolic_refine(&cmnd, tau);
            return (refined > 0.0).then(|| sr / refined);
        }
        tau += 1;
    }
    None
}

fn parabolic_refine(values: &[f64], index: usize) -> f64 {
    if index == 0 || index + 1 >= values.len() {
        return index as f64;
    }
    let (a, b, c) = (values[index - 1], values[index], values[index + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < f64::EPSILON {
        return index as f64;
    }
    index as f64 + 0.5 * (a - c) / denom
}

/// Population standard deviation
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
