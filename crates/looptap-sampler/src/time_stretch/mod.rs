//! Offline time-stretching of recorded audio.
//!
//! - [`PhaseVocoder`]: mono phase vocoder (duration changes, pitch does not)
//! - [`OfflineStretcher`]: multi-channel study/process/retrieve transform
//! - [`TimeStretchPipeline`]: replaces the current buffer with a stretched copy

mod phase_vocoder;
mod pipeline;
mod stretcher;
mod types;

pub use phase_vocoder::PhaseVocoder;
pub use pipeline::{StretchReport, TimeStretchPipeline};
pub use stretcher::OfflineStretcher;
pub use types::{FftSize, ProcessMode, StretchError, StretchOptions};
