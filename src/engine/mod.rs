//! Audio Engine Module
//!
//! Signal plumbing ahead of any analysis:
//! - Mono PCM sample container
//! - Container decoding
//! - Resampling to the analysis rate

pub mod buffer;
pub mod decode;
pub mod resample;

pub use buffer::{
    calculate_peak, calculate_rms, AudioSample, ANALYSIS_SAMPLE_RATE, SUPPORTED_SAMPLE_RATES,
};
pub use decode::{encode_wav, AudioDecoder};
pub use resample::Resampler;
