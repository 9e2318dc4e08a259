//! Explanation catalog
//!
//! Read-only table of interchangeable rationale templates per category.
//! Built once, shared by every request.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, Result};

/// Fixed explanation for verdicts below the detail threshold
pub const LOW_CONFIDENCE_DISCLAIMER: &str =
    "Classification confidence is low; no specific acoustic evidence is reported.";

/// Rationale category chosen from the verdict and the features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationCategory {
    /// Flat pitch contour
    Monotone,
    /// Energy missing above the typical vocoder band
    HighFrequencyCutoff,
    /// Noise-like spectral texture
    Artifact,
    /// Synthetic with no single dominant cue
    GenericSynthetic,
    /// Wide natural pitch movement
    DynamicNatural,
    /// Human with no single dominant cue
    NaturalBaseline,
}

impl ExplanationCategory {
    pub const ALL: [ExplanationCategory; 6] = [
        Self::Monotone,
        Self::HighFrequencyCutoff,
        Self::Artifact,
        Self::GenericSynthetic,
        Self::DynamicNatural,
        Self::NaturalBaseline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monotone => "monotone",
            Self::HighFrequencyCutoff => "high_frequency_cutoff",
            Self::Artifact => "artifact",
            Self::GenericSynthetic => "generic_synthetic",
            Self::DynamicNatural => "dynamic_natural",
            Self::NaturalBaseline => "natural_baseline",
        }
    }

    /// Whether this category backs an AI_GENERATED verdict
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self,
            Self::Monotone | Self::HighFrequencyCutoff | Self::Artifact | Self::GenericSynthetic
        )
    }
}

impl fmt::Display for ExplanationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category to template table plus the low-confidence disclaimer
#[derive(Debug, Clone)]
pub struct ExplanationCatalog {
    templates: HashMap<ExplanationCategory, Vec<String>>,
    disclaimer: String,
}

static SHARED: OnceLock<Arc<ExplanationCatalog>> = OnceLock::new();

impl ExplanationCatalog {
    /// Build a catalog, rejecting any category without a template
    pub fn new(
        templates: HashMap<ExplanationCategory, Vec<String>>,
        disclaimer: impl Into<String>,
    ) -> Result<Self> {
        for category in ExplanationCategory::ALL {
            let ok = templates
                .get(&category)
                .map(|set| !set.is_empty() && set.iter().all(|t| !t.trim().is_empty()))
                .unwrap_or(false);
            if !ok {
                return Err(DetectorError::configuration(format!(
                    "explanation category '{}' needs at least one non-empty template",
                    category
                )));
            }
        }

        let disclaimer = disclaimer.into();
        if disclaimer.trim().is_empty() {
            return Err(DetectorError::configuration(
                "low-confidence disclaimer must not be empty",
            ));
        }

        Ok(Self {
            templates,
            disclaimer,
        })
    }

    /// Process-wide built-in catalog
    pub fn shared() -> Arc<ExplanationCatalog> {
        SHARED.get_or_init(|| Arc::new(Self::builtin())).clone()
    }

    fn builtin() -> Self {
        let table: [(ExplanationCategory, &[&str]); 6] = [
            (
                ExplanationCategory::Monotone,
                &[
                    "Pitch stays unnaturally flat across the clip, typical of synthesized speech.",
                    "The fundamental frequency barely moves, lacking the intonation of a live speaker.",
                    "Monotone prosody with almost no pitch variation suggests a speech synthesizer.",
                ],
            ),
            (
                ExplanationCategory::HighFrequencyCutoff,
                &[
                    "Spectral energy drops off sharply in the upper band, a common vocoder footprint.",
                    "High-frequency content is truncated, consistent with band-limited neural synthesis.",
                    "Most energy sits below 6 kHz with an abrupt cutoff above, typical of generated audio.",
                ],
            ),
            (
                ExplanationCategory::Artifact,
                &[
                    "Noise-like spectral texture points to synthesis artifacts in the waveform.",
                    "The spectrum is unusually flat, consistent with vocoder or codec artifacts.",
                    "Diffuse broadband energy without clear harmonic structure suggests generated speech.",
                ],
            ),
            (
                ExplanationCategory::GenericSynthetic,
                &[
                    "Detected synthetic spectral patterns and lack of natural breath pauses.",
                    "Overall acoustic profile matches known text-to-speech output.",
                    "The model found characteristics consistent with machine-generated speech.",
                ],
            ),
            (
                ExplanationCategory::DynamicNatural,
                &[
                    "Wide, natural pitch movement indicates a live human speaker.",
                    "Expressive intonation with large pitch swings is characteristic of natural speech.",
                    "Dynamic prosody and pitch variation are consistent with a human voice.",
                ],
            ),
            (
                ExplanationCategory::NaturalBaseline,
                &[
                    "Natural pitch variations and background noise characteristics observed.",
                    "Acoustic profile is consistent with a recorded human speaker.",
                    "No synthesis markers were found; the signal resembles natural speech.",
                ],
            ),
        ];

        let templates: HashMap<_, Vec<String>> = table
            .iter()
            .map(|(category, set)| (*category, set.iter().map(|t| t.to_string()).collect()))
            .collect();

        Self {
            templates,
            disclaimer: LOW_CONFIDENCE_DISCLAIMER.to_string(),
        }
    }

    /// Templates for a category; never empty
    pub fn templates(&self, category: ExplanationCategory) -> &[String] {
        self.templates
            .get(&category)
            .map(|set| set.as_slice())
            .unwrap_or(&[])
    }

    pub fn disclaimer(&self) -> &str {
        &self.disclaimer
    }

    /// Whether `text` belongs to the category's template set
    pub fn contains(&self, category: ExplanationCategory, text: &str) -> bool {
        self.templates(category).iter().any(|t| t == text)
    }

    /// Category whose template set holds `text`, if any
    pub fn category_of(&self, text: &str) -> Option<ExplanationCategory> {
        ExplanationCategory::ALL
            .into_iter()
            .find(|c| self.contains(*c, text))
    }
}
