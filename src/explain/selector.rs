//! Explanation selection
//!
//! The category is a pure function of label, confidence and features.
//! Only the wording inside a category is random, and the random source is
//! passed in so callers can seed it.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use super::catalog::{ExplanationCatalog, ExplanationCategory};
use crate::analysis::FeatureVector;
use crate::classify::VoiceLabel;
use crate::config::EXPLANATION_DETAIL_THRESHOLD;

/// Pitch std-dev (Hz) below which synthetic speech reads as monotone
pub const MONOTONE_PITCH_VARIANCE: f64 = 20.0;

/// Roll-off (Hz) below which synthetic speech reads as band-limited
pub const CUTOFF_ROLLOFF_HZ: f64 = 6000.0;

/// Flatness above which synthetic speech reads as artifact-laden
pub const ARTIFACT_FLATNESS: f64 = 0.05;

/// Pitch std-dev (Hz) above which human speech reads as dynamic
pub const DYNAMIC_PITCH_VARIANCE: f64 = 40.0;

/// Picks a rationale for a verdict
#[derive(Debug, Clone)]
pub struct ExplanationSelector {
    catalog: Arc<ExplanationCatalog>,
    detail_threshold: f64,
}

impl ExplanationSelector {
    pub fn new(catalog: Arc<ExplanationCatalog>, detail_threshold: f64) -> Self {
        Self {
            catalog,
            detail_threshold,
        }
    }

    pub fn catalog(&self) -> &Arc<ExplanationCatalog> {
        &self.catalog
    }

    pub fn detail_threshold(&self) -> f64 {
        self.detail_threshold
    }

    /// Whether a verdict at this confidence gets a feature-driven explanation
    pub fn wants_features(&self, confidence: f64) -> bool {
        confidence >= self.detail_threshold
    }

    /// Category for a verdict, or `None` when the disclaimer applies
    pub fn select_category(
        &self,
        label: VoiceLabel,
        confidence: f64,
        features: &FeatureVector,
    ) -> Option<ExplanationCategory> {
        if !self.wants_features(confidence) {
            return None;
        }

        let category = match label {
            VoiceLabel::AiGenerated => {
                if features.pitch_variance < MONOTONE_PITCH_VARIANCE {
                    ExplanationCategory::Monotone
                } else if features.spectral_rolloff < CUTOFF_ROLLOFF_HZ {
                    ExplanationCategory::HighFrequencyCutoff
                } else if features.spectral_flatness > ARTIFACT_FLATNESS {
                    ExplanationCategory::Artifact
                } else {
                    ExplanationCategory::GenericSynthetic
                }
            }
            VoiceLabel::Human => {
                if features.pitch_variance > DYNAMIC_PITCH_VARIANCE {
                    ExplanationCategory::DynamicNatural
                } else {
                    ExplanationCategory::NaturalBaseline
                }
            }
        };
        Some(category)
    }

    /// Explanation text for a verdict
    pub fn explain<R: Rng + ?Sized>(
        &self,
        label: VoiceLabel,
        confidence: f64,
        features: &FeatureVector,
        rng: &mut R,
    ) -> String {
        match self.select_category(label, confidence, features) {
            Some(category) => self
                .catalog
                .templates(category)
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| self.catalog.disclaimer().to_string()),
            None => self.catalog.disclaimer().to_string(),
        }
    }
}

impl Default for ExplanationSelector {
    fn default() -> Self {
        Self::new(ExplanationCatalog::shared(), EXPLANATION_DETAIL_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_case::test_case;

    fn features(pitch_variance: f64, spectral_flatness: f64, spectral_rolloff: f64) -> FeatureVector {
        FeatureVector {
            pitch_variance,
            spectral_flatness,
            spectral_rolloff,
            rms_energy: 0.1,
        }
    }

    #[test_case(VoiceLabel::AiGenerated, 5.0, 0.3, 7000.0 => ExplanationCategory::Monotone ; "flat pitch beats everything")]
    #[test_case(VoiceLabel::AiGenerated, 19.99, 0.0, 1000.0 => ExplanationCategory::Monotone ; "just under monotone bound")]
    #[test_case(VoiceLabel::AiGenerated, 20.0, 0.3, 5000.0 => ExplanationCategory::HighFrequencyCutoff ; "monotone bound is exclusive")]
    #[test_case(VoiceLabel::AiGenerated, 30.0, 0.3, 6000.0 => ExplanationCategory::Artifact ; "cutoff bound is exclusive")]
    #[test_case(VoiceLabel::AiGenerated, 30.0, 0.05, 8000.0 => ExplanationCategory::GenericSynthetic ; "flatness bound is exclusive")]
    #[test_case(VoiceLabel::AiGenerated, 30.0, 0.01, 8000.0 => ExplanationCategory::GenericSynthetic ; "no dominant cue")]
    #[test_case(VoiceLabel::Human, 40.5, 0.3, 1000.0 => ExplanationCategory::DynamicNatural ; "dynamic pitch")]
    #[test_case(VoiceLabel::Human, 40.0, 0.3, 1000.0 => ExplanationCategory::NaturalBaseline ; "dynamic bound is exclusive")]
    #[test_case(VoiceLabel::Human, 0.0, 0.0, 0.0 => ExplanationCategory::NaturalBaseline ; "zero features")]
    fn test_category_rules(label: VoiceLabel, pv: f64, flat: f64, rolloff: f64) -> ExplanationCategory {
        ExplanationSelector::default()
            .select_category(label, 0.9, &features(pv, flat, rolloff))
            .unwrap()
    }

    #[test]
    fn test_zero_features_ai_is_monotone() {
        let selector = ExplanationSelector::default();
        assert_eq!(
            selector.select_category(VoiceLabel::AiGenerated, 0.95, &FeatureVector::zero()),
            Some(ExplanationCategory::Monotone)
        );
    }

    #[test]
    fn test_low_confidence_is_disclaimer() {
        let selector = ExplanationSelector::default();
        let mut rng = StdRng::seed_from_u64(1);
        for label in [VoiceLabel::AiGenerated, VoiceLabel::Human] {
            for confidence in [0.0, 0.3, 0.59] {
                assert_eq!(selector.select_category(label, confidence, &features(100.0, 0.5, 9000.0)), None);
                assert_eq!(
                    selector.explain(label, confidence, &features(5.0, 0.0, 100.0), &mut rng),
                    selector.catalog().disclaimer()
                );
            }
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let selector = ExplanationSelector::default();
        assert!(selector.wants_features(0.60));
        assert!(!selector.wants_features(0.59));
    }

    #[test]
    fn test_wording_is_member_of_category() {
        let selector = ExplanationSelector::default();
        let fv = features(60.0, 0.1, 3000.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let text = selector.explain(VoiceLabel::Human, 0.8, &fv, &mut rng);
            assert!(selector
                .catalog()
                .contains(ExplanationCategory::DynamicNatural, &text));
        }
    }

    #[test]
    fn test_seeded_wording_repeats() {
        let selector = ExplanationSelector::default();
        let fv = features(30.0, 0.2, 7000.0);
        let a: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10)
                .map(|_| selector.explain(VoiceLabel::AiGenerated, 0.9, &fv, &mut rng))
                .collect()
        };
        let b: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10)
                .map(|_| selector.explain(VoiceLabel::AiGenerated, 0.9, &fv, &mut rng))
                .collect()
        };
        assert_eq!(a, b);
    }
}
