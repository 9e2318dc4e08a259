//! Human-readable rationale for verdicts

pub mod catalog;
pub mod selector;

pub use catalog::{ExplanationCatalog, ExplanationCategory, LOW_CONFIDENCE_DISCLAIMER};
pub use selector::ExplanationSelector;
