//! Request-layer plumbing
//!
//! Schema validation, API key check and status mapping for the
//! voice-detection endpoint. No HTTP server is bundled; any framework can
//! call [`handle_voice_detection`] and send back the [`ApiResponse`].

mod auth;
mod handler;
mod request;

pub use auth::{ApiKeyGuard, API_KEY_HEADER};
pub use handler::{handle_voice_detection, handle_voice_detection_json, ApiResponse};
pub use request::{Language, RequestError, VoiceAnalysisRequest, MIN_PAYLOAD_CHARS};
