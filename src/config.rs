//! Detector configuration
//!
//! Loaded once at startup from an optional JSON file, then patched from
//! `VOXGUARD_*` environment variables. Every field has a default, so an
//! empty file (or no file) yields a working configuration.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::SilencePolicy;
use crate::classify::LabelMapping;
use crate::error::{DetectorError, Result};
use crate::explain::{ExplanationCatalog, ExplanationCategory, LOW_CONFIDENCE_DISCLAIMER};
use crate::neural::BackendConfig;

/// Confidence below which explanations skip feature analysis
pub const EXPLANATION_DETAIL_THRESHOLD: f64 = 0.60;

/// Development API key used when none is configured
pub const DEFAULT_API_KEY: &str = "sk_test_123456789";

pub const ENV_BRIDGE_URL: &str = "VOXGUARD_BRIDGE_URL";
pub const ENV_BRIDGE_TIMEOUT_MS: &str = "VOXGUARD_BRIDGE_TIMEOUT_MS";
pub const ENV_API_KEY: &str = "VOXGUARD_API_KEY";
pub const ENV_EXPLANATION_SEED: &str = "VOXGUARD_EXPLANATION_SEED";

/// Top-level configuration for a detector instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Silence short-circuit policy
    pub silence: SilencePolicy,

    /// Minimum confidence for feature-driven explanations
    pub explanation_detail_threshold: f64,

    /// Backend tag to semantic label table
    pub label_mapping: LabelMapping,

    /// Seed for explanation wording; `None` draws from entropy
    pub explanation_seed: Option<u64>,

    /// Replacement wording per category; `None` keeps the built-in catalog
    pub explanation_templates: Option<HashMap<ExplanationCategory, Vec<String>>>,

    /// Which inference backend to load
    pub backend: BackendConfig,

    /// Key the request layer expects in `x-api-key`
    pub api_key: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            silence: SilencePolicy::default(),
            explanation_detail_threshold: EXPLANATION_DETAIL_THRESHOLD,
            label_mapping: LabelMapping::default(),
            explanation_seed: None,
            explanation_templates: None,
            backend: BackendConfig::default(),
            api_key: DEFAULT_API_KEY.to_string(),
        }
    }
}

impl DetectorConfig {
    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let json = std::fs::read_to_string(path).map_err(|e| {
            DetectorError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Patch fields from `VOXGUARD_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Patch fields from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BRIDGE_URL) {
            if let BackendConfig::Bridge { url: current, .. } = &mut self.backend {
                *current = url;
            }
        }

        if let Some(raw) = lookup(ENV_BRIDGE_TIMEOUT_MS) {
            let parsed: u64 = raw.parse().map_err(|_| {
                DetectorError::configuration(format!("{} must be an integer, got {:?}", ENV_BRIDGE_TIMEOUT_MS, raw))
            })?;
            if let BackendConfig::Bridge { timeout_ms, .. } = &mut self.backend {
                *timeout_ms = parsed;
            }
        }

        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = key;
        }

        if let Some(raw) = lookup(ENV_EXPLANATION_SEED) {
            let seed = raw.parse().map_err(|_| {
                DetectorError::configuration(format!("{} must be an integer, got {:?}", ENV_EXPLANATION_SEED, raw))
            })?;
            self.explanation_seed = Some(seed);
        }

        self.validate()
    }

    /// Catalog the explanation selector draws wording from
    pub fn explanation_catalog(&self) -> Result<Arc<ExplanationCatalog>> {
        match &self.explanation_templates {
            Some(templates) => Ok(Arc::new(ExplanationCatalog::new(
                templates.clone(),
                LOW_CONFIDENCE_DISCLAIMER,
            )?)),
            None => Ok(ExplanationCatalog::shared()),
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        self.silence.validate()?;
        if !(0.0..=1.0).contains(&self.explanation_detail_threshold) {
            return Err(DetectorError::configuration(format!(
                "explanation_detail_threshold must be within [0, 1], got {}",
                self.explanation_detail_threshold
            )));
        }
        if self.api_key.is_empty() {
            return Err(DetectorError::configuration("api_key must not be empty"));
        }
        self.explanation_catalog().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::VoiceLabel;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.silence.rms_threshold, 0.005);
        assert_eq!(config.silence.default_label, VoiceLabel::Human);
        assert_eq!(config.explanation_detail_threshold, 0.60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = DetectorConfig::from_json("{}").unwrap();
        assert_eq!(config.api_key, DEFAULT_API_KEY);
        assert!(config.explanation_seed.is_none());
    }

    #[test]
    fn test_partial_json() {
        let config = DetectorConfig::from_json(
            r#"{ "explanation_seed": 42, "silence": { "rms_threshold": 0.01 } }"#,
        )
        .unwrap();
        assert_eq!(config.explanation_seed, Some(42));
        assert_eq!(config.silence.rms_threshold, 0.01);
        assert_eq!(config.silence.default_label, VoiceLabel::Human);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = DetectorConfig::from_json(r#"{ "explanation_detail_threshold": 1.5 }"#)
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_unknown_field_rejected() {
        // The analysis rate is fixed at 16 kHz and cannot be configured
        let err = DetectorConfig::from_json(r#"{ "analysis_sample_rate": 8000 }"#).unwrap_err();
        assert!(matches!(err, DetectorError::Serialization(_)));
    }

    #[test]
    fn test_custom_explanation_templates() {
        let templates: serde_json::Map<String, serde_json::Value> = ExplanationCategory::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), serde_json::json!([format!("custom {}", c)])))
            .collect();
        let json = serde_json::json!({ "explanation_templates": templates }).to_string();

        let config = DetectorConfig::from_json(&json).unwrap();
        let catalog = config.explanation_catalog().unwrap();
        assert_eq!(
            catalog.templates(ExplanationCategory::Monotone),
            &["custom monotone".to_string()]
        );
        assert_eq!(catalog.disclaimer(), LOW_CONFIDENCE_DISCLAIMER);
    }

    #[test]
    fn test_incomplete_explanation_templates_rejected() {
        let err = DetectorConfig::from_json(
            r#"{ "explanation_templates": { "monotone": ["flat"] } }"#,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "api_key": "sk_live_abc" }}"#).unwrap();
        let config = DetectorConfig::load(file.path()).unwrap();
        assert_eq!(config.api_key, "sk_live_abc");
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = DetectorConfig::load(Path::new("/nonexistent/voxguard.json")).unwrap_err();
        assert!(matches!(err, DetectorError::Configuration { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut config = DetectorConfig {
            backend: BackendConfig::Bridge {
                url: "http://localhost:8001".to_string(),
                timeout_ms: 1000,
            },
            ..DetectorConfig::default()
        };
        let env: HashMap<&str, &str> = [
            (ENV_BRIDGE_URL, "http://model:9000"),
            (ENV_BRIDGE_TIMEOUT_MS, "2500"),
            (ENV_API_KEY, "sk_env"),
            (ENV_EXPLANATION_SEED, "9"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        match &config.backend {
            BackendConfig::Bridge { url, timeout_ms } => {
                assert_eq!(url, "http://model:9000");
                assert_eq!(*timeout_ms, 2500);
            }
            other => panic!("Expected bridge backend, got: {:?}", other),
        }
        assert_eq!(config.api_key, "sk_env");
        assert_eq!(config.explanation_seed, Some(9));
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = DetectorConfig::default();
        let result = config.apply_overrides_from(|k| {
            (k == ENV_EXPLANATION_SEED).then(|| "not-a-number".to_string())
        });
        assert!(result.is_err());
    }
}
