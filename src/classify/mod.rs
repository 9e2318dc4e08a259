//! Verdict production
//!
//! Backend scores in, semantic label and confidence out.

pub mod engine;
pub mod labels;
pub mod verdict;

pub use engine::{argmax, round_confidence, softmax, ClassificationEngine, Prediction};
pub use labels::LabelMapping;
pub use verdict::{Verdict, VoiceLabel};
