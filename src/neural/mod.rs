//! Inference backends
//!
//! This module provides:
//! - `InferenceBackend` trait for every classifier behind the engine
//! - Deterministic mock backends for testing
//! - HTTP bridge to a remote model server
//! - Backend construction from configuration

mod bridge;
mod mock;
mod model;
mod registry;

pub use bridge::{BridgeBackend, DEFAULT_BRIDGE_TIMEOUT_MS, DEFAULT_BRIDGE_URL};
pub use mock::*;
pub use model::{BackendInfo, InferenceBackend};
pub use registry::{load_backend, BackendConfig, DEFAULT_CLASS_TAGS};
