//! Semantic verdict types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic label reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceLabel {
    /// Machine-synthesized speech
    AiGenerated,
    /// Naturally produced speech
    Human,
}

impl VoiceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiGenerated => "AI_GENERATED",
            Self::Human => "HUMAN",
        }
    }
}

impl fmt::Display for VoiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label plus the probability mass of the winning class, rounded to
/// two decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: VoiceLabel,
    pub confidence: f64,
}

impl Verdict {
    pub fn new(label: VoiceLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_wire_names() {
        assert_eq!(
            serde_json::to_string(&VoiceLabel::AiGenerated).unwrap(),
            "\"AI_GENERATED\""
        );
        assert_eq!(serde_json::to_string(&VoiceLabel::Human).unwrap(), "\"HUMAN\"");
        let parsed: VoiceLabel = serde_json::from_str("\"AI_GENERATED\"").unwrap();
        assert_eq!(parsed, VoiceLabel::AiGenerated);
        assert_eq!(VoiceLabel::Human.to_string(), "HUMAN");
    }
}
