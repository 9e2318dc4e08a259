//! Mock backend implementations for testing
//!
//! These backends don't run a real model but behave deterministically,
//! so pipeline tests can pin the verdict they expect.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::{BackendInfo, InferenceBackend};
use crate::engine::{calculate_peak, calculate_rms};
use crate::error::{DetectorError, Result};

/// Backend that returns the same logits for every clip
pub struct FixedScoreBackend {
    info: BackendInfo,
    logits: Vec<f32>,
}

impl FixedScoreBackend {
    /// Backend with explicit logits
    ///
    /// The logit count is not checked against the tags, so tests can
    /// build a backend that reports a malformed score vector.
    pub fn new(logits: Vec<f32>, tags: Vec<String>) -> Self {
        Self {
            info: BackendInfo::new(
                "fixed",
                "Fixed Scores",
                "1.0-mock",
                "Returns constant logits regardless of input (MOCK)",
                tags,
            ),
            logits,
        }
    }

    /// Backend whose softmax reproduces the given probabilities
    pub fn from_probabilities(probabilities: &[f64], tags: Vec<String>) -> Self {
        let logits = probabilities
            .iter()
            .map(|p| p.max(f64::MIN_POSITIVE).ln() as f32)
            .collect();
        Self::new(logits, tags)
    }

    pub fn logits(&self) -> &[f32] {
        &self.logits
    }
}

impl InferenceBackend for FixedScoreBackend {
    fn info(&self) -> &BackendInfo {
        &self.info
    }

    fn infer(&self, _samples: &[f32]) -> Result<Vec<f32>> {
        Ok(self.logits.clone())
    }
}

/// Number of statistics the probe reads from a clip
const PROBE_FEATURES: usize = 3;

/// Fixed-seed linear probe over simple clip statistics
///
/// Weights are drawn once from the seed, so the same seed and the same
/// samples always give the same scores.
pub struct SeededProbeBackend {
    info: BackendInfo,
    seed: u64,
    weights: Vec<[f32; PROBE_FEATURES]>,
    bias: Vec<f32>,
}

impl SeededProbeBackend {
    pub fn new(seed: u64, tags: Vec<String>) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let weights = tags
            .iter()
            .map(|_| {
                let mut row = [0.0_f32; PROBE_FEATURES];
                for w in row.iter_mut() {
                    *w = rng.gen_range(-4.0..4.0);
                }
                row
            })
            .collect();
        let bias = tags.iter().map(|_| rng.gen_range(-0.5..0.5)).collect();

        Self {
            info: BackendInfo::new(
                "seeded-probe",
                "Seeded Probe",
                "1.0-mock",
                "Deterministic linear probe over RMS, zero-crossing rate and peak (MOCK)",
                tags,
            ),
            seed,
            weights,
            bias,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn statistics(samples: &[f32]) -> [f32; PROBE_FEATURES] {
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        let zcr = if samples.len() > 1 {
            crossings as f32 / (samples.len() - 1) as f32
        } else {
            0.0
        };
        [calculate_rms(samples), zcr, calculate_peak(samples)]
    }
}

impl InferenceBackend for SeededProbeBackend {
    fn info(&self) -> &BackendInfo {
        &self.info
    }

    fn infer(&self, samples: &[f32]) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Err(DetectorError::inference("probe received an empty clip"));
        }
        let stats = Self::statistics(samples);
        Ok(self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&stats).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect())
    }
}

/// Backend whose every call fails, for error-path tests
pub struct UnavailableBackend {
    info: BackendInfo,
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: &str, tags: Vec<String>) -> Self {
        Self {
            info: BackendInfo::new(
                "unavailable",
                "Unavailable",
                "1.0-mock",
                "Fails every inference call (MOCK)",
                tags,
            ),
            reason: reason.to_string(),
        }
    }
}

impl InferenceBackend for UnavailableBackend {
    fn info(&self) -> &BackendInfo {
        &self.info
    }

    fn infer(&self, _samples: &[f32]) -> Result<Vec<f32>> {
        Err(DetectorError::inference(self.reason.clone()))
    }
}
