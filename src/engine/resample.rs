//! Resampling to the analysis rate using rubato
//!
//! Band-limited sinc interpolation: content above the target Nyquist is
//! filtered out instead of folding back into the analysis band. The
//! resampler is rebuilt for every clip with fixed parameters and a single
//! chunk spanning the whole clip, so identical input always yields
//! identical output.

use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::engine::buffer::{AudioSample, SUPPORTED_SAMPLE_RATES};
use crate::error::{DetectorError, Result};

/// Fixed interpolation settings; changing them changes every verdict
fn sinc_parameters() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Stateless resampler front-end
pub struct Resampler;

impl Resampler {
    /// Convert a clip to `target_rate`.
    ///
    /// A clip already at the target rate is returned as a copy. Source
    /// rates outside [`SUPPORTED_SAMPLE_RATES`] are rejected.
    pub fn resample(audio: &AudioSample, target_rate: u32) -> Result<AudioSample> {
        let input_rate = audio.sample_rate();

        if !SUPPORTED_SAMPLE_RATES.contains(&input_rate) || target_rate == 0 {
            return Err(DetectorError::inference(format!(
                "cannot resample between {}Hz and {}Hz",
                input_rate, target_rate
            )));
        }

        if input_rate == target_rate {
            debug!("Sample rate already at {}Hz, skipping resample", target_rate);
            return Ok(audio.clone());
        }

        if audio.is_empty() {
            return Ok(AudioSample::new(Vec::new(), target_rate));
        }

        debug!("Resampling from {}Hz to {}Hz", input_rate, target_rate);

        let ratio = target_rate as f64 / input_rate as f64;
        let input_frames = audio.len();
        let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, sinc_parameters(), input_frames, 1)
            .map_err(|e| DetectorError::inference(format!("failed to create resampler: {}", e)))?;

        let planar_input = vec![audio.samples().to_vec()];
        let mut output = resampler
            .process(&planar_input, None)
            .map_err(|e| DetectorError::inference(format!("resampling failed: {}", e)))?
            .pop()
            .unwrap_or_default();

        // flush the filter tail, then drop the leading delay
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| DetectorError::inference(format!("resampling failed: {}", e)))?
            .pop()
            .unwrap_or_default();
        output.extend(tail);

        let delay = resampler.output_delay().min(output.len());
        let expected = (input_frames as f64 * ratio).round() as usize;
        let mut output = output.split_off(delay);
        output.truncate(expected);

        debug!(
            "Resampled {} input frames to {} output frames",
            input_frames,
            output.len()
        );

        Ok(AudioSample::new(output, target_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::{calculate_rms, ANALYSIS_SAMPLE_RATE};
    use approx::assert_relative_eq;

    #[test]
    fn test_resample_same_rate() {
        let clip = AudioSample::sine_wave(440.0, 0.5, 0.1, ANALYSIS_SAMPLE_RATE);
        let out = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap();
        assert_eq!(out, clip);
    }

    #[test]
    fn test_resample_downsample_length() {
        let clip = AudioSample::sine_wave(440.0, 0.5, 1.0, 44_100);
        let out = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap();

        assert_eq!(out.sample_rate(), ANALYSIS_SAMPLE_RATE);
        let expected = ANALYSIS_SAMPLE_RATE as i64;
        let diff = (out.len() as i64 - expected).abs();
        // Allow up to 1% difference in length
        assert!(diff < expected / 100, "got {} frames", out.len());
    }

    #[test]
    fn test_downsample_length_is_exact() {
        let clip = AudioSample::white_noise(0.3, 1.0, 48_000, 4);
        let out = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn test_out_of_band_tone_is_filtered() {
        // 12kHz sits above the 8kHz Nyquist of the analysis rate
        let clip = AudioSample::sine_wave(12_000.0, 0.5, 1.0, 48_000);
        let out = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap();

        let in_rms = calculate_rms(clip.samples());
        let out_rms = calculate_rms(out.samples());
        assert!(out_rms < in_rms * 0.1, "alias survived: {} -> {}", in_rms, out_rms);
    }

    #[test]
    fn test_in_band_tone_is_kept() {
        let clip = AudioSample::sine_wave(1_000.0, 0.5, 1.0, 48_000);
        let out = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap();

        let in_rms = calculate_rms(clip.samples());
        let out_rms = calculate_rms(out.samples());
        assert_relative_eq!(out_rms, in_rms, max_relative = 0.02);
    }

    #[test]
    fn test_resample_rejects_implausible_rate() {
        let clip = AudioSample::new(vec![0.1; 20_000], 10);
        let err = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap_err();
        assert_eq!(err.error_code(), "INFERENCE_ERROR");
    }

    #[test]
    fn test_resample_is_bit_stable() {
        let clip = AudioSample::white_noise(0.3, 0.5, 22_050, 11);
        let a = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap();
        let b = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resample_rejects_zero_rate() {
        let clip = AudioSample::new(vec![0.1; 32], 0);
        assert!(Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).is_err());
    }

    #[test]
    fn test_resample_empty_clip() {
        let clip = AudioSample::new(Vec::new(), 48_000);
        let out = Resampler::resample(&clip, ANALYSIS_SAMPLE_RATE).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.sample_rate(), ANALYSIS_SAMPLE_RATE);
    }
}
