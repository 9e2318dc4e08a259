//! Voice detector
//!
//! Sequences the pipeline for one clip:
//! decode → resample → silence gate → inference → features → explanation.
//!
//! A `VoiceDetector` is built once at startup around the shared backend and
//! is safe to call from many threads at once.

mod result;

pub use result::{ClassificationResult, ResultStatus};

use std::path::Path;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::analysis::{FeatureVector, GateReading, SignalFeatureExtractor, SilenceGate};
use crate::classify::{ClassificationEngine, Prediction, Verdict};
use crate::config::DetectorConfig;
use crate::engine::{AudioDecoder, AudioSample};
use crate::error::Result;
use crate::explain::ExplanationSelector;
use crate::neural::{load_backend, InferenceBackend};

/// Everything the pipeline learned about one clip
#[derive(Debug, Clone)]
pub struct Analysis {
    pub verdict: Verdict,
    pub explanation: String,
    /// Silence gate reading on the canonical samples
    pub gate: GateReading,
    /// Backend output; `None` when the clip was gated as silent
    pub prediction: Option<Prediction>,
    /// Features; `None` when gated or below the detail threshold
    pub features: Option<FeatureVector>,
    /// Rate the clip was decoded at
    pub source_rate: u32,
    pub duration_secs: f64,
}

impl Analysis {
    pub fn is_silent(&self) -> bool {
        self.gate.silent
    }

    pub fn to_result(&self) -> ClassificationResult {
        ClassificationResult::success(self.verdict, self.explanation.clone())
    }
}

/// End-to-end classifier for encoded clips
pub struct VoiceDetector {
    config: DetectorConfig,
    gate: SilenceGate,
    engine: ClassificationEngine,
    extractor: SignalFeatureExtractor,
    selector: ExplanationSelector,
    rng: Mutex<StdRng>,
}

impl VoiceDetector {
    /// Build a detector around an already loaded backend
    pub fn new(config: DetectorConfig, backend: Arc<dyn InferenceBackend>) -> Result<Self> {
        config.validate()?;

        let rng = match config.explanation_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            gate: SilenceGate::new(config.silence.clone()),
            engine: ClassificationEngine::new(backend, config.label_mapping.clone()),
            extractor: SignalFeatureExtractor::new(),
            selector: ExplanationSelector::new(
                config.explanation_catalog()?,
                config.explanation_detail_threshold,
            ),
            rng: Mutex::new(rng),
            config,
        })
    }

    /// Load the configured backend and build a detector around it
    pub fn from_config(config: DetectorConfig) -> Result<Self> {
        let backend = load_backend(&config.backend)?;
        Self::new(config, backend)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn engine(&self) -> &ClassificationEngine {
        &self.engine
    }

    pub fn selector(&self) -> &ExplanationSelector {
        &self.selector
    }

    /// Classify an encoded clip
    pub fn classify_request(&self, bytes: &[u8]) -> Result<ClassificationResult> {
        Ok(self.analyze(bytes)?.to_result())
    }

    /// Decode and analyze an encoded clip
    pub fn analyze(&self, bytes: &[u8]) -> Result<Analysis> {
        let span = info_span!(
            "classify_request",
            request_id = %Uuid::new_v4(),
            payload_sha256 = %format!("{:x}", Sha256::digest(bytes)),
            payload_len = bytes.len(),
        );
        let _enter = span.enter();

        let audio = AudioDecoder::decode(bytes)?;
        self.analyze_audio(&audio)
    }

    /// Decode and analyze a file on disk
    pub fn analyze_file(&self, path: &Path) -> Result<Analysis> {
        let span = info_span!("classify_file", path = %path.display());
        let _enter = span.enter();

        let audio = AudioDecoder::decode_file(path)?;
        self.analyze_audio(&audio)
    }

    /// Analyze PCM samples at any rate
    pub fn analyze_samples(&self, samples: &[f32], sample_rate: u32) -> Result<Analysis> {
        self.analyze_audio(&AudioSample::new(samples.to_vec(), sample_rate))
    }

    /// Analyze a decoded clip
    pub fn analyze_audio(&self, audio: &AudioSample) -> Result<Analysis> {
        debug!(
            "Decoded {} samples at {} Hz ({:.2}s)",
            audio.len(),
            audio.sample_rate(),
            audio.duration_secs()
        );

        let canonical = self.engine.canonicalize(audio)?;
        let gate = self.gate.measure(canonical.samples());

        if gate.silent {
            let policy = self.gate.policy();
            info!(
                "Clip is silent (rms {:.5} < {}), reporting {}",
                gate.rms, policy.rms_threshold, policy.default_label
            );
            return Ok(Analysis {
                verdict: Verdict::new(policy.default_label, 0.0),
                explanation: policy.explanation.clone(),
                gate,
                prediction: None,
                features: None,
                source_rate: audio.sample_rate(),
                duration_secs: audio.duration_secs(),
            });
        }

        let prediction = self.engine.predict(canonical.samples())?;
        let verdict = self.engine.verdict_for(&prediction);

        let features = if self.selector.wants_features(verdict.confidence) {
            let features =
                self.extractor
                    .extract(canonical.samples(), canonical.sample_rate(), gate.rms);
            debug!("Features: {:?}", features);
            Some(features)
        } else {
            debug!(
                "Confidence {:.2} below detail threshold, skipping feature analysis",
                verdict.confidence
            );
            None
        };

        let explanation = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.selector.explain(
                verdict.label,
                verdict.confidence,
                &features.unwrap_or_default(),
                &mut *rng,
            )
        };

        info!(
            "Verdict {} (confidence {:.2}, backend tag '{}')",
            verdict.label, verdict.confidence, prediction.tag
        );

        Ok(Analysis {
            verdict,
            explanation,
            gate,
            prediction: Some(prediction),
            features,
            source_rate: audio.sample_rate(),
            duration_secs: audio.duration_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SILENCE_EXPLANATION;
    use crate::classify::VoiceLabel;
    use crate::engine::{encode_wav, ANALYSIS_SAMPLE_RATE};
    use crate::explain::ExplanationCategory;
    use crate::neural::{FixedScoreBackend, UnavailableBackend};

    fn tags() -> Vec<String> {
        vec!["real".to_string(), "fake".to_string()]
    }

    fn detector(backend: impl InferenceBackend + 'static) -> VoiceDetector {
        let config = DetectorConfig {
            explanation_seed: Some(3),
            ..DetectorConfig::default()
        };
        VoiceDetector::new(config, Arc::new(backend)).unwrap()
    }

    #[test]
    fn test_silence_skips_backend() {
        let detector = detector(UnavailableBackend::new("must not be called", tags()));
        let analysis = detector
            .analyze_samples(&vec![0.0; 16_000], ANALYSIS_SAMPLE_RATE)
            .unwrap();

        assert!(analysis.is_silent());
        assert_eq!(analysis.verdict, Verdict::new(VoiceLabel::Human, 0.0));
        assert_eq!(analysis.explanation, SILENCE_EXPLANATION);
        assert!(analysis.prediction.is_none());
        assert!(analysis.features.is_none());
    }

    #[test]
    fn test_low_confidence_skips_features() {
        let detector = detector(FixedScoreBackend::from_probabilities(&[0.45, 0.55], tags()));
        let clip = AudioSample::white_noise(0.3, 1.0, ANALYSIS_SAMPLE_RATE, 2);
        let analysis = detector.analyze_audio(&clip).unwrap();

        assert_eq!(analysis.verdict.label, VoiceLabel::AiGenerated);
        assert_eq!(analysis.verdict.confidence, 0.55);
        assert!(analysis.features.is_none());
        assert_eq!(analysis.explanation, detector.selector().catalog().disclaimer());
    }

    #[test]
    fn test_confident_verdict_uses_features() {
        let detector = detector(FixedScoreBackend::from_probabilities(&[0.2, 0.8], tags()));
        let clip = AudioSample::white_noise(0.3, 1.0, ANALYSIS_SAMPLE_RATE, 2);
        let analysis = detector.analyze_audio(&clip).unwrap();

        let features = analysis.features.unwrap();
        assert!((features.rms_energy - analysis.gate.rms as f64).abs() < 1e-9);
        let category = detector
            .selector()
            .catalog()
            .category_of(&analysis.explanation)
            .unwrap();
        assert!(category.is_synthetic());
        assert_eq!(
            Some(category),
            detector
                .selector()
                .select_category(VoiceLabel::AiGenerated, 0.8, &features)
        );
        assert_ne!(category, ExplanationCategory::HighFrequencyCutoff);
    }

    #[test]
    fn test_configured_wording_is_used() {
        let templates = ExplanationCategory::ALL
            .into_iter()
            .map(|c| (c, vec![format!("house wording for {}", c)]))
            .collect();
        let config = DetectorConfig {
            explanation_templates: Some(templates),
            ..DetectorConfig::default()
        };
        let backend = FixedScoreBackend::from_probabilities(&[0.2, 0.8], tags());
        let detector = VoiceDetector::new(config, Arc::new(backend)).unwrap();

        let clip = AudioSample::white_noise(0.3, 1.0, ANALYSIS_SAMPLE_RATE, 2);
        let analysis = detector.analyze_audio(&clip).unwrap();
        assert!(analysis.explanation.starts_with("house wording for "));
    }

    #[test]
    fn test_decode_errors_surface() {
        let detector = detector(FixedScoreBackend::from_probabilities(&[0.2, 0.8], tags()));
        let err = detector.classify_request(&[]).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_ERROR");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_classify_request_from_wav() {
        let detector = detector(FixedScoreBackend::from_probabilities(&[0.8, 0.2], tags()));
        let clip = AudioSample::white_noise(0.3, 1.0, 22_050, 4);
        let result = detector
            .classify_request(&encode_wav(&clip).unwrap())
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.classification, Some(VoiceLabel::Human));
        assert_eq!(result.confidence_score, Some(0.8));
    }
}
