//! # Looptap - Loopback Recorder
//!
//! Captures whatever the default output device is playing, then plays it back
//! faster or slower without changing its pitch.
//!
//! ## Architecture
//!
//! Looptap is an umbrella crate that coordinates:
//! - **looptap-core** - Buffer, transport state machine, RT callbacks, device backends
//! - **looptap-sampler** - Capture and playback engines, offline time-stretch
//!
//! ## Quick Start
//!
//! ```ignore
//! use looptap::prelude::*;
//!
//! let mut engine = LooptapEngine::builder()
//!     .max_record_secs(10.0)
//!     .build()?;
//!
//! engine.begin_record(Instant::now())?;
//! // ... poll until the buffer fills or call end_record()
//! engine.set_speed_ratio(1.5)?;
//! engine.begin_play(Instant::now())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - cpal host backend
//! - `hardware` - real devices through cpal; without it only the manual backend exists

/// Re-export of looptap-core for direct access
pub use looptap_core as core;

/// Re-export of looptap-sampler for direct access
pub use looptap_sampler as sampler;

pub use looptap_core::{
    AudioBackend, AudioBuffer, DeviceInfo, LooptapConfig, ManualBackend, Phase, Sawtooth,
    TransportRequest,
};
#[cfg(feature = "hardware")]
pub use looptap_core::CpalBackend;
pub use looptap_sampler::{CaptureStarted, PlayOutcome, PollOutcome, StretchReport};

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;
mod events;
mod view;

pub use builder::LooptapEngineBuilder;
pub use engine::{Action, LooptapEngine, EVENT_QUEUE_CAPACITY};
pub use events::{EngineEvent, StopReason};
pub use view::RenderView;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Action, EngineEvent, LooptapEngine, LooptapEngineBuilder, RenderView};

    pub use crate::{LooptapConfig, Phase, PlayOutcome, PollOutcome};

    pub use std::time::Instant;
}
