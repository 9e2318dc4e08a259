//! Backend tag to semantic label mapping
//!
//! Backends name their classes in their own vocabulary ("fake", "spoof",
//! "bonafide", "LABEL_0", ...). The mapping is data, loaded from config,
//! so a new backend vocabulary never needs a code change.
//!
//! Resolution order, all case-insensitive:
//! 1. `exact` table
//! 2. tag equal to a synthetic placeholder (default `label_0`)
//! 3. tag containing a synthetic marker (default `fake`, `spoof`)
//! 4. `default_label`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::verdict::VoiceLabel;

/// Configurable tag mapping policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelMapping {
    /// Tags with an explicit label, checked first
    pub exact: BTreeMap<String, VoiceLabel>,
    /// Opaque placeholder tags that denote the synthetic class
    pub synthetic_placeholders: Vec<String>,
    /// Substrings marking a tag as synthetic
    pub synthetic_markers: Vec<String>,
    /// Label for any tag no rule matches
    pub default_label: VoiceLabel,
}

impl Default for LabelMapping {
    fn default() -> Self {
        Self {
            exact: BTreeMap::new(),
            synthetic_placeholders: vec!["label_0".to_string()],
            synthetic_markers: vec!["fake".to_string(), "spoof".to_string()],
            default_label: VoiceLabel::Human,
        }
    }
}

impl LabelMapping {
    /// Map one backend tag to a semantic label
    pub fn resolve(&self, tag: &str) -> VoiceLabel {
        let lower = tag.trim().to_lowercase();

        if let Some(label) = self
            .exact
            .iter()
            .find(|(key, _)| key.to_lowercase() == lower)
            .map(|(_, label)| *label)
        {
            return label;
        }

        if self
            .synthetic_placeholders
            .iter()
            .any(|p| p.to_lowercase() == lower)
        {
            return VoiceLabel::AiGenerated;
        }

        if self
            .synthetic_markers
            .iter()
            .filter(|m| !m.is_empty())
            .any(|m| lower.contains(&m.to_lowercase()))
        {
            return VoiceLabel::AiGenerated;
        }

        self.default_label
    }

    /// Map every class tag of a backend, in class-index order
    pub fn resolve_all(&self, tags: &[String]) -> Vec<VoiceLabel> {
        tags.iter().map(|t| self.resolve(t)).collect()
    }

    /// Add an explicit tag entry
    pub fn with_exact(mut self, tag: &str, label: VoiceLabel) -> Self {
        self.exact.insert(tag.to_string(), label);
        self
    }
}
