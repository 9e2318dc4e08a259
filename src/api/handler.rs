//! Voice-detection request handling
//!
//! Routing lives outside this crate; this is the function a route calls.

use serde::Serialize;
use tracing::{error, info, warn};

use super::auth::ApiKeyGuard;
use super::request::{RequestError, VoiceAnalysisRequest};
use crate::detector::{ClassificationResult, VoiceDetector};

/// Status code plus body, ready for any HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: ClassificationResult,
}

impl ApiResponse {
    pub fn ok(body: ClassificationResult) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    pub fn rejected(err: &RequestError) -> Self {
        Self {
            status_code: err.status_code(),
            body: ClassificationResult::error(err.to_string()),
        }
    }
}

/// Authenticate, validate and classify one request
pub fn handle_voice_detection(
    detector: &VoiceDetector,
    guard: &ApiKeyGuard,
    api_key: Option<&str>,
    request: &VoiceAnalysisRequest,
) -> ApiResponse {
    match authenticate(guard, api_key) {
        Ok(()) => classify_authenticated(detector, request),
        Err(response) => response,
    }
}

/// Parse a raw JSON body, then handle it
///
/// The key is checked before the body is parsed.
pub fn handle_voice_detection_json(
    detector: &VoiceDetector,
    guard: &ApiKeyGuard,
    api_key: Option<&str>,
    body: &str,
) -> ApiResponse {
    if let Err(response) = authenticate(guard, api_key) {
        return response;
    }

    match VoiceAnalysisRequest::from_json(body) {
        Ok(request) => classify_authenticated(detector, &request),
        Err(e) => {
            warn!("Rejected request: {}", e);
            ApiResponse::rejected(&e)
        }
    }
}

fn authenticate(guard: &ApiKeyGuard, api_key: Option<&str>) -> Result<(), ApiResponse> {
    guard.verify(api_key).map_err(|e| {
        warn!("Rejected request: {}", e);
        ApiResponse::rejected(&e)
    })
}

fn classify_authenticated(detector: &VoiceDetector, request: &VoiceAnalysisRequest) -> ApiResponse {
    info!("Received voice analysis request for language: {}", request.language);

    let bytes = match request.decode_payload() {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Rejected request: {}", e);
            return ApiResponse::rejected(&e);
        }
    };

    match detector.classify_request(&bytes) {
        Ok(result) => ApiResponse::ok(result.with_language(request.language.as_str())),
        Err(e) => {
            error!("Voice analysis failed [{}]: {}", e.error_code(), e);
            ApiResponse {
                status_code: e.http_status(),
                body: ClassificationResult::from_error(&e),
            }
        }
    }
}
