//! Backend construction
//!
//! Turns a [`BackendConfig`] into the single shared backend instance the
//! process serves with. Any failure here is a `ConfigurationError`, and
//! the process must not start serving.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::bridge::{BridgeBackend, DEFAULT_BRIDGE_TIMEOUT_MS, DEFAULT_BRIDGE_URL};
use super::mock::{FixedScoreBackend, SeededProbeBackend};
use super::model::InferenceBackend;
use crate::error::{DetectorError, Result};

/// Class tags of the default two-class backend
pub const DEFAULT_CLASS_TAGS: [&str; 2] = ["fake", "real"];

fn default_tags() -> Vec<String> {
    DEFAULT_CLASS_TAGS.iter().map(|s| s.to_string()).collect()
}

fn default_bridge_url() -> String {
    DEFAULT_BRIDGE_URL.to_string()
}

fn default_bridge_timeout_ms() -> u64 {
    DEFAULT_BRIDGE_TIMEOUT_MS
}

/// Which backend to load at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Constant logits
    Fixed {
        logits: Vec<f32>,
        #[serde(default = "default_tags")]
        tags: Vec<String>,
    },
    /// Deterministic probe drawn from a seed
    Seeded {
        #[serde(default)]
        seed: u64,
        #[serde(default = "default_tags")]
        tags: Vec<String>,
    },
    /// Remote model server
    Bridge {
        #[serde(default = "default_bridge_url")]
        url: String,
        #[serde(default = "default_bridge_timeout_ms")]
        timeout_ms: u64,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Seeded {
            seed: 0,
            tags: default_tags(),
        }
    }
}

impl BackendConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Fixed { .. } => "fixed",
            BackendConfig::Seeded { .. } => "seeded",
            BackendConfig::Bridge { .. } => "bridge",
        }
    }

    /// Whether this backend is a stand-in with no trained model behind it
    pub fn is_mock(&self) -> bool {
        !matches!(self, BackendConfig::Bridge { .. })
    }
}

/// Build the process-wide backend
pub fn load_backend(config: &BackendConfig) -> Result<Arc<dyn InferenceBackend>> {
    let backend: Arc<dyn InferenceBackend> = match config {
        BackendConfig::Fixed { logits, tags } => {
            if logits.len() != tags.len() {
                return Err(DetectorError::configuration(format!(
                    "fixed backend has {} logits for {} tags",
                    logits.len(),
                    tags.len()
                )));
            }
            if logits.iter().any(|l| !l.is_finite()) {
                return Err(DetectorError::configuration(
                    "fixed backend logits must be finite",
                ));
            }
            Arc::new(FixedScoreBackend::new(logits.clone(), tags.clone()))
        }
        BackendConfig::Seeded { seed, tags } => {
            Arc::new(SeededProbeBackend::new(*seed, tags.clone()))
        }
        BackendConfig::Bridge { url, timeout_ms } => {
            if *timeout_ms == 0 {
                return Err(DetectorError::configuration(
                    "bridge timeout_ms must be positive",
                ));
            }
            Arc::new(BridgeBackend::connect(url, *timeout_ms)?)
        }
    };

    check_tags(backend.class_tags())?;
    info!(
        "Loaded {} backend '{}' with classes {:?}",
        config.kind(),
        backend.id(),
        backend.class_tags()
    );
    if config.is_mock() {
        warn!(
            "Backend '{}' is not a trained model; verdicts are for testing only",
            backend.id()
        );
    }
    Ok(backend)
}

fn check_tags(tags: &[String]) -> Result<()> {
    if tags.is_empty() {
        return Err(DetectorError::configuration(
            "backend must expose at least one class tag",
        ));
    }
    if let Some(pos) = tags.iter().position(|t| t.trim().is_empty()) {
        return Err(DetectorError::configuration(format!(
            "backend class tag {} is empty",
            pos
        )));
    }
    Ok(())
}
