//! Externally visible classification result

use serde::{Deserialize, Serialize};

use crate::classify::{Verdict, VoiceLabel};
use crate::error::DetectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

/// Terminal artifact of one request
///
/// On success `classification`, `confidenceScore` and `explanation` are all
/// present. On error only `status` and `message` are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub status: ResultStatus,

    /// Caller-supplied language, echoed back unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<VoiceLabel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClassificationResult {
    pub fn success(verdict: Verdict, explanation: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Success,
            language: None,
            classification: Some(verdict.label),
            confidence_score: Some(verdict.confidence),
            explanation: Some(explanation.into()),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            language: None,
            classification: None,
            confidence_score: None,
            explanation: None,
            message: Some(message.into()),
        }
    }

    /// Error result carrying only the client-safe message
    pub fn from_error(err: &DetectorError) -> Self {
        Self::error(err.client_message())
    }

    /// Echo the request language on a successful result
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        if self.is_success() {
            self.language = Some(language.into());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
