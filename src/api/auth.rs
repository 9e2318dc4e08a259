//! API key check for the `x-api-key` header

use super::request::RequestError;

/// Header carrying the key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Compares presented keys against the configured one
#[derive(Clone)]
pub struct ApiKeyGuard {
    expected: String,
}

impl ApiKeyGuard {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// Accept only an exact match; a missing header is a mismatch
    pub fn verify(&self, provided: Option<&str>) -> Result<(), RequestError> {
        match provided {
            Some(key) if constant_time_eq(key.as_bytes(), self.expected.as_bytes()) => Ok(()),
            _ => Err(RequestError::Unauthorized),
        }
    }
}

impl std::fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGuard").field("expected", &"<redacted>").finish()
    }
}

/// Byte comparison whose timing does not depend on where inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
