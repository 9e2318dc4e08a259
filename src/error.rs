//! Error handling for Voxguard
//!
//! Only decode and inference failures ever reach a caller as the error
//! branch of a classification result. Configuration errors are fatal at
//! startup. Feature-extraction faults never surface here at all.

use std::fmt;

use thiserror::Error;

/// Result type alias for Voxguard operations
pub type Result<T> = std::result::Result<T, DetectorError>;

/// Why an audio payload could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Zero-length payload
    Empty,
    /// Container recognised but its contents are corrupt
    Malformed,
    /// Container ended before any audio frame was produced
    Truncated,
    /// Container or codec is not one we can read
    Unsupported,
    /// Decoder-internal fault unrelated to the payload shape
    Internal,
}

impl DecodeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Malformed => "malformed",
            Self::Truncated => "truncated",
            Self::Unsupported => "unsupported",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for Voxguard operations
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Audio decode failed ({kind}): {reason}")]
    Decode {
        kind: DecodeErrorKind,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Inference failed: {reason}")]
    Inference { reason: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DetectorError {
    /// Decode error without an underlying cause
    pub fn decode(kind: DecodeErrorKind, reason: impl Into<String>) -> Self {
        DetectorError::Decode {
            kind,
            reason: reason.into(),
            source: None,
        }
    }

    /// Decode error wrapping a lower-level decoder fault
    pub fn decode_with<E>(kind: DecodeErrorKind, reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DetectorError::Decode {
            kind,
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn inference(reason: impl Into<String>) -> Self {
        DetectorError::Inference {
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        DetectorError::Configuration {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DetectorError::Decode { .. } => "DECODE_ERROR",
            DetectorError::Inference { .. } => "INFERENCE_ERROR",
            DetectorError::Configuration { .. } => "CONFIGURATION_ERROR",
            DetectorError::Io(_) => "IO_ERROR",
            DetectorError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// The decode failure kind, if this is a decode error
    pub fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            DetectorError::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the fault lies with the submitted audio rather than the server
    pub fn is_client_fault(&self) -> bool {
        matches!(self, DetectorError::Decode { .. })
    }

    /// HTTP status the request layer should answer with
    pub fn http_status(&self) -> u16 {
        if self.is_client_fault() {
            400
        } else {
            500
        }
    }

    /// Message safe to hand back to a client.
    ///
    /// Decoder internals stay in the logs; the client only learns which
    /// side of the exchange failed.
    pub fn client_message(&self) -> String {
        match self {
            DetectorError::Decode { .. } => {
                "Invalid audio data: the payload could not be decoded as audio".to_string()
            }
            DetectorError::Inference { .. } => {
                "Voice analysis failed due to an internal error".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DetectorError::decode(DecodeErrorKind::Empty, "no bytes");
        assert_eq!(err.error_code(), "DECODE_ERROR");
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::Empty));

        let err = DetectorError::inference("bad scores");
        assert_eq!(err.error_code(), "INFERENCE_ERROR");
        assert_eq!(err.decode_kind(), None);
    }

    #[test]
    fn test_fault_side() {
        assert!(DetectorError::decode(DecodeErrorKind::Malformed, "x").is_client_fault());
        assert_eq!(
            DetectorError::decode(DecodeErrorKind::Unsupported, "x").http_status(),
            400
        );
        assert!(!DetectorError::inference("x").is_client_fault());
        assert_eq!(DetectorError::inference("x").http_status(), 500);
    }

    #[test]
    fn test_client_message_hides_internals() {
        let err = DetectorError::decode(DecodeErrorKind::Malformed, "frame header at byte 417");
        assert!(!err.client_message().contains("417"));
        assert!(err.to_string().contains("417"));
        assert!(err.to_string().contains("malformed"));
    }
}
