//! Voxguard - Forensic Voice Classification
//!
//! Voxguard decides whether a short speech clip was machine-synthesized or
//! spoken by a person, and explains the verdict in terms of the signal.
//!
//! # Architecture
//!
//! Data flows one way through the pipeline:
//! - Decode: encoded bytes to mono PCM at the clip's native rate
//! - Gate: silent clips short-circuit to a fixed verdict
//! - Classify: resample, run the injected backend, softmax, map the tag
//! - Explain: feature-driven category, randomized wording
//!
//! The backend is loaded once at startup and shared read-only by every
//! request; see [`neural::InferenceBackend`].

pub mod analysis;
pub mod api;
pub mod classify;
pub mod cli;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod explain;
pub mod neural;

pub use classify::{Verdict, VoiceLabel};
pub use config::DetectorConfig;
pub use detector::{Analysis, ClassificationResult, ResultStatus, VoiceDetector};
pub use error::{DecodeErrorKind, DetectorError, Result};
