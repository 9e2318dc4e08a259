//! Inference backend trait and core types
//!
//! Defines the interface every classification backend must implement.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Information about a loaded backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Backend identifier (e.g., "fixed", "seeded-probe", "bridge")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Backend version
    pub version: String,

    /// Description of what the backend does
    pub description: String,

    /// Tag for each class index, in index order
    pub class_tags: Vec<String>,
}

impl BackendInfo {
    pub fn new(id: &str, name: &str, version: &str, description: &str, class_tags: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            description: description.to_string(),
            class_tags,
        }
    }
}

/// Trait that all inference backends must implement
///
/// Implementations are shared across request threads and must not mutate
/// state during `infer`.
pub trait InferenceBackend: Send + Sync {
    /// Get backend information
    fn info(&self) -> &BackendInfo;

    /// Produce one raw score per class from canonical PCM samples
    ///
    /// # Arguments
    /// * `samples` - Mono samples at the analysis rate, in [-1, 1]
    ///
    /// # Returns
    /// Unnormalized scores (logits), one per class tag
    fn infer(&self, samples: &[f32]) -> Result<Vec<f32>>;

    /// Tag for each class index
    fn class_tags(&self) -> &[String] {
        &self.info().class_tags
    }

    /// Number of classes the score vector must cover
    fn num_classes(&self) -> usize {
        self.class_tags().len()
    }

    /// Get backend ID (convenience method)
    fn id(&self) -> &str {
        &self.info().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant {
        info: BackendInfo,
    }

    impl InferenceBackend for Constant {
        fn info(&self) -> &BackendInfo {
            &self.info
        }

        fn infer(&self, _samples: &[f32]) -> Result<Vec<f32>> {
            Ok(vec![0.0; self.num_classes()])
        }
    }

    #[test]
    fn test_provided_methods() {
        let backend = Constant {
            info: BackendInfo::new(
                "constant",
                "Constant",
                "1.0",
                "Always zero",
                vec!["fake".to_string(), "real".to_string()],
            ),
        };

        assert_eq!(backend.id(), "constant");
        assert_eq!(backend.num_classes(), 2);
        assert_eq!(backend.class_tags()[1], "real");
        assert_eq!(backend.infer(&[0.0; 8]).unwrap(), vec![0.0, 0.0]);
    }
}
