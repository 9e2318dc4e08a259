//! Audio sample container
//!
//! Mono PCM in [-1, 1] plus the rate it was captured at. Once built an
//! `AudioSample` is never mutated; every stage downstream of the decoder
//! only borrows it.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Constants
// ============================================================================

/// Canonical analysis rate for inference and feature extraction (16kHz)
pub const ANALYSIS_SAMPLE_RATE: u32 = 16_000;

/// Source rates accepted from decoded or caller-supplied audio
pub const SUPPORTED_SAMPLE_RATES: RangeInclusive<u32> = 4_000..=384_000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Root-mean-square amplitude of a slice. Zero for an empty slice.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Maximum absolute amplitude of a slice
pub fn calculate_peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

// ============================================================================
// AudioSample
// ============================================================================

/// Immutable mono PCM clip
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSample {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSample {
    /// Wrap already-normalized mono samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// RMS over the whole clip
    pub fn rms(&self) -> f32 {
        calculate_rms(&self.samples)
    }

    pub fn peak(&self) -> f32 {
        calculate_peak(&self.samples)
    }

    /// Give up ownership of the samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    // ------------------------------------------------------------------------
    // Generators (fixtures for tests and CLI smoke runs)
    // ------------------------------------------------------------------------

    /// Sine tone
    pub fn sine_wave(frequency: f32, amplitude: f32, duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
        let samples = (0..num_samples)
            .map(|i| amplitude * (angular_freq * i as f32).sin())
            .collect();
        Self::new(samples, sample_rate)
    }

    /// All-zero clip
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        Self::new(vec![0.0; num_samples], sample_rate)
    }

    /// Uniform white noise with the requested RMS, reproducible from `seed`
    pub fn white_noise(rms: f32, duration_secs: f32, sample_rate: u32, seed: u64) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        // uniform on [-a, a] has RMS a / sqrt(3)
        let amplitude = (rms * 3.0_f32.sqrt()).min(1.0);
        let mut rng = StdRng::seed_from_u64(seed);
        let samples = (0..num_samples)
            .map(|_| rng.gen_range(-amplitude..=amplitude))
            .collect();
        Self::new(samples, sample_rate)
    }
}
