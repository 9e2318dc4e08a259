//! Classification engine
//!
//! Resample to the analysis rate, run the injected backend, softmax the
//! scores, pick the winner (lowest index on ties), map its tag through the
//! label table and round the confidence to two decimals.

use std::sync::Arc;

use tracing::debug;

use super::labels::LabelMapping;
use super::verdict::{Verdict, VoiceLabel};
use crate::engine::{AudioSample, Resampler, ANALYSIS_SAMPLE_RATE};
use crate::error::{DetectorError, Result};
use crate::neural::InferenceBackend;

/// Full outcome of one backend call, before it is reduced to a verdict
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Winning class index
    pub class_index: usize,
    /// Backend tag of the winning class
    pub tag: String,
    /// Softmax distribution over all classes
    pub probabilities: Vec<f64>,
    /// Probability of the winning class, rounded to two decimals
    pub confidence: f64,
}

/// Maps canonical PCM to a semantic verdict through an injected backend
pub struct ClassificationEngine {
    backend: Arc<dyn InferenceBackend>,
    mapping: LabelMapping,
}

impl ClassificationEngine {
    pub fn new(backend: Arc<dyn InferenceBackend>, mapping: LabelMapping) -> Self {
        Self { backend, mapping }
    }

    pub fn backend(&self) -> &Arc<dyn InferenceBackend> {
        &self.backend
    }

    pub fn mapping(&self) -> &LabelMapping {
        &self.mapping
    }

    /// Resample a clip to the 16 kHz analysis rate
    pub fn canonicalize(&self, audio: &AudioSample) -> Result<AudioSample> {
        Resampler::resample(audio, ANALYSIS_SAMPLE_RATE)
    }

    /// Classify samples at any rate
    pub fn classify(&self, samples: &[f32], source_rate: u32) -> Result<Verdict> {
        let audio = AudioSample::new(samples.to_vec(), source_rate);
        let canonical = self.canonicalize(&audio)?;
        self.classify_canonical(canonical.samples())
    }

    /// Classify samples already at the analysis rate
    pub fn classify_canonical(&self, samples: &[f32]) -> Result<Verdict> {
        let prediction = self.predict(samples)?;
        Ok(self.verdict_for(&prediction))
    }

    /// Run the backend and normalize its scores
    pub fn predict(&self, samples: &[f32]) -> Result<Prediction> {
        let scores = self.backend.infer(samples)?;
        let tags = self.backend.class_tags();

        if scores.len() != tags.len() {
            return Err(DetectorError::inference(format!(
                "backend '{}' returned {} scores for {} classes",
                self.backend.id(),
                scores.len(),
                tags.len()
            )));
        }
        if let Some(pos) = scores.iter().position(|s| !s.is_finite()) {
            return Err(DetectorError::inference(format!(
                "backend '{}' returned non-finite score {} at index {}",
                self.backend.id(),
                scores[pos],
                pos
            )));
        }

        let probabilities = softmax(&scores).ok_or_else(|| {
            DetectorError::inference(format!("backend '{}' returned no scores", self.backend.id()))
        })?;
        let class_index = argmax(&probabilities).ok_or_else(|| {
            DetectorError::inference("softmax produced an empty distribution")
        })?;
        let confidence = round_confidence(probabilities[class_index]);

        debug!(
            "Backend scores {:?} -> class {} ({}) p={:.4}",
            scores, class_index, tags[class_index], probabilities[class_index]
        );

        Ok(Prediction {
            class_index,
            tag: tags[class_index].clone(),
            probabilities,
            confidence,
        })
    }

    /// Reduce a prediction to its semantic verdict
    pub fn verdict_for(&self, prediction: &Prediction) -> Verdict {
        Verdict::new(self.label_for(&prediction.tag), prediction.confidence)
    }

    pub fn label_for(&self, tag: &str) -> VoiceLabel {
        self.mapping.resolve(tag)
    }
}

/// Numerically stable softmax; `None` for an empty or non-finite input
pub fn softmax(scores: &[f32]) -> Option<Vec<f64>> {
    let max = scores
        .iter()
        .map(|&s| s as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }

    let exps: Vec<f64> = scores.iter().map(|&s| (s as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    Some(exps.into_iter().map(|e| e / sum).collect())
}

/// Index of the largest value; the lowest index wins ties
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Round to two decimal places, clamped to [0, 1]
pub fn round_confidence(p: f64) -> f64 {
    ((p * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AudioSample, ANALYSIS_SAMPLE_RATE};
    use crate::neural::{FixedScoreBackend, SeededProbeBackend, UnavailableBackend};
    use approx::assert_abs_diff_eq;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn engine_with(backend: impl InferenceBackend + 'static) -> ClassificationEngine {
        ClassificationEngine::new(Arc::new(backend), LabelMapping::default())
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let p = softmax(&[1000.0, 1000.0]).unwrap();
        assert_abs_diff_eq!(p[0], 0.5, epsilon = 1e-12);
        assert!(softmax(&[]).is_none());
    }

    #[test]
    fn test_argmax_lowest_index_on_tie() {
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.8999), 0.90);
        assert_eq!(round_confidence(0.123), 0.12);
        assert_eq!(round_confidence(1.0), 1.0);
        assert_eq!(round_confidence(0.0), 0.0);
    }

    #[test]
    fn test_fake_tag_wins() {
        let engine = engine_with(FixedScoreBackend::from_probabilities(
            &[0.1, 0.9],
            tags(&["real", "fake"]),
        ));
        let verdict = engine.classify_canonical(&[0.1; 1600]).unwrap();
        assert_eq!(verdict.label, VoiceLabel::AiGenerated);
        assert_eq!(verdict.confidence, 0.90);
    }

    #[test]
    fn test_placeholder_tags() {
        let engine = engine_with(FixedScoreBackend::new(
            vec![3.0, 0.0],
            tags(&["LABEL_0", "LABEL_1"]),
        ));
        let prediction = engine.predict(&[0.1; 1600]).unwrap();
        assert_eq!(prediction.class_index, 0);
        assert_eq!(prediction.tag, "LABEL_0");
        assert_eq!(engine.verdict_for(&prediction).label, VoiceLabel::AiGenerated);

        let engine = engine_with(FixedScoreBackend::new(
            vec![0.0, 3.0],
            tags(&["LABEL_0", "LABEL_1"]),
        ));
        assert_eq!(
            engine.classify_canonical(&[0.1; 1600]).unwrap().label,
            VoiceLabel::Human
        );
    }

    #[test]
    fn test_tie_picks_class_zero() {
        let engine = engine_with(FixedScoreBackend::new(vec![0.7, 0.7], tags(&["real", "fake"])));
        let verdict = engine.classify_canonical(&[0.1; 160]).unwrap();
        assert_eq!(verdict.label, VoiceLabel::Human);
        assert_eq!(verdict.confidence, 0.5);
    }

    #[test]
    fn test_wrong_length_is_inference_error() {
        let engine = engine_with(FixedScoreBackend::new(
            vec![0.1, 0.2, 0.7],
            tags(&["fake", "real"]),
        ));
        let err = engine.classify_canonical(&[0.1; 160]).unwrap_err();
        assert_eq!(err.error_code(), "INFERENCE_ERROR");
    }

    #[test]
    fn test_non_finite_is_inference_error() {
        let engine = engine_with(FixedScoreBackend::new(
            vec![f32::NAN, 0.2],
            tags(&["fake", "real"]),
        ));
        assert!(matches!(
            engine.classify_canonical(&[0.1; 160]),
            Err(DetectorError::Inference { .. })
        ));

        let engine = engine_with(FixedScoreBackend::new(
            vec![f32::INFINITY, 0.2],
            tags(&["fake", "real"]),
        ));
        assert!(engine.classify_canonical(&[0.1; 160]).is_err());
    }

    #[test]
    fn test_empty_scores_is_inference_error() {
        let engine = engine_with(FixedScoreBackend::new(vec![], vec![]));
        assert!(matches!(
            engine.classify_canonical(&[0.1; 160]),
            Err(DetectorError::Inference { .. })
        ));
    }

    #[test]
    fn test_backend_failure_propagates() {
        let engine = engine_with(UnavailableBackend::new("model offline", tags(&["fake", "real"])));
        let err = engine.classify_canonical(&[0.1; 160]).unwrap_err();
        assert!(err.to_string().contains("model offline"));
    }

    #[test]
    fn test_classify_resamples_foreign_rate() {
        let engine = engine_with(SeededProbeBackend::new(5, tags(&["fake", "real"])));
        let clip = AudioSample::white_noise(0.3, 1.0, 44_100, 8);

        let first = engine.classify(clip.samples(), 44_100).unwrap();
        let second = engine.classify(clip.samples(), 44_100).unwrap();
        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.confidence));

        let canonical = engine.canonicalize(&clip).unwrap();
        assert_eq!(canonical.sample_rate(), ANALYSIS_SAMPLE_RATE);
        assert_eq!(engine.classify_canonical(canonical.samples()).unwrap(), first);
    }
}
