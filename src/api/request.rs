//! Voice analysis request schema and validation

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest base64 payload worth decoding
pub const MIN_PAYLOAD_CHARS: usize = 100;

/// Language the clip is spoken in; carried for display only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    Tamil,
    #[default]
    English,
    Hindi,
    Malayalam,
    Telugu,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tamil => "Tamil",
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Malayalam => "Malayalam",
            Self::Telugu => "Telugu",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tamil" => Some(Self::Tamil),
            "english" => Some(Self::English),
            "hindi" => Some(Self::Hindi),
            "malayalam" => Some(Self::Malayalam),
            "telugu" => Some(Self::Telugu),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejections raised before the detector is invoked
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invalid or missing API Key")]
    Unauthorized,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Empty audio string")]
    EmptyPayload,

    #[error("Audio string too short to be valid ({len} < {} characters)", MIN_PAYLOAD_CHARS)]
    PayloadTooShort { len: usize },

    #[error("Invalid Base64 string: {0}")]
    InvalidBase64(String),
}

impl RequestError {
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::Unauthorized => 401,
            _ => 422,
        }
    }
}

/// Body of a voice-detection call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAnalysisRequest {
    #[serde(default)]
    pub language: Language,
    pub audio_base64: String,
}

impl VoiceAnalysisRequest {
    pub fn new(language: Language, audio: &[u8]) -> Self {
        Self {
            language,
            audio_base64: BASE64.encode(audio),
        }
    }

    /// Parse and validate a JSON body
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let request: Self =
            serde_json::from_str(json).map_err(|e| RequestError::MalformedBody(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Structural checks on the payload
    pub fn validate(&self) -> Result<(), RequestError> {
        self.decode_payload().map(|_| ())
    }

    /// Validated payload bytes
    pub fn decode_payload(&self) -> Result<Vec<u8>, RequestError> {
        let payload = self.audio_base64.trim();
        if payload.is_empty() {
            return Err(RequestError::EmptyPayload);
        }
        if payload.len() < MIN_PAYLOAD_CHARS {
            return Err(RequestError::PayloadTooShort { len: payload.len() });
        }
        BASE64
            .decode(payload)
            .map_err(|e| RequestError::InvalidBase64(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_default_and_parse() {
        let request: VoiceAnalysisRequest =
            serde_json::from_str(r#"{ "audioBase64": "AAAA" }"#).unwrap();
        assert_eq!(request.language, Language::English);
        assert_eq!(Language::parse(" TAMIL "), Some(Language::Tamil));
        assert_eq!(Language::parse("french"), None);
    }

    #[test]
    fn test_unknown_language_rejected() {
        let err = VoiceAnalysisRequest::from_json(r#"{ "language": "French", "audioBase64": "" }"#)
            .unwrap_err();
        assert!(matches!(err, RequestError::MalformedBody(_)));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_payload_checks() {
        let empty = VoiceAnalysisRequest {
            language: Language::Hindi,
            audio_base64: "  ".to_string(),
        };
        assert_eq!(empty.validate(), Err(RequestError::EmptyPayload));

        let short = VoiceAnalysisRequest {
            language: Language::Hindi,
            audio_base64: "QUJD".to_string(),
        };
        assert_eq!(short.validate(), Err(RequestError::PayloadTooShort { len: 4 }));

        let invalid = VoiceAnalysisRequest {
            language: Language::Hindi,
            audio_base64: "!".repeat(120),
        };
        assert!(matches!(invalid.validate(), Err(RequestError::InvalidBase64(_))));
    }

    #[test]
    fn test_payload_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        let request = VoiceAnalysisRequest::new(Language::Telugu, &bytes);
        assert_eq!(request.decode_payload().unwrap(), bytes);

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"audioBase64\""));
        assert!(json.contains("\"Telugu\""));
        assert_eq!(VoiceAnalysisRequest::from_json(&json).unwrap(), request);
    }
}
