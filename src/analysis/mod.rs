//! Signal analysis
//!
//! Energy gating ahead of inference and the acoustic descriptors that
//! drive explanations.

pub mod features;
pub mod gate;

pub use features::{FeatureError, FeatureVector, SignalFeatureExtractor};
pub use gate::{
    mean_frame_rms, GateReading, SilenceGate, SilencePolicy, SILENCE_EXPLANATION,
    SILENCE_RMS_THRESHOLD,
};
