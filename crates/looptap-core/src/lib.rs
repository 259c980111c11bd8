//! Loopback recorder runtime: audio buffer, transport, real-time callbacks,
//! device resolution and stream backends.
//!
//! # Primary API
//!
//! - [`AudioBuffer`] / [`BufferSlot`]: interleaved sample store shared by every engine
//! - [`TransportState`]: Idle/Recording/Playing arbiter and speed ratio
//! - [`AudioBackend`] / [`AudioStream`]: device enumeration and stream lifecycle
//! - [`CaptureCallback`] / [`PlaybackCallback`]: real-time callbacks
//! - [`find_loopback_device`]: loopback mirror of the default output
//! - [`CompletionPoller`]: cooperative stream-completion timer
//!
//! # Features
//!
//! - `"hardware"`: [`CpalBackend`] for real devices (enabled by default)

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{LooptapConfig, DEFAULT_LOOPBACK_MARKER};

pub(crate) mod lockfree;
pub use lockfree::{AtomicDouble, AtomicFlag, AtomicTag};

pub mod buffer;
pub use buffer::{AudioBuffer, BufferSlot};

pub mod transport;
pub use transport::{Phase, TransportRequest, TransportState, TRANSITIONS};

pub mod callback;
pub use callback::{capture_block, playback_block, CallbackFlow, CaptureCallback, PlaybackCallback};

pub mod backend;
#[cfg(feature = "hardware")]
pub use backend::CpalBackend;
pub use backend::{
    AudioBackend, AudioStream, DeviceInfo, InputCallback, ManualBackend, OutputCallback,
    StreamMonitor, StreamParams, StreamStatus,
};

pub mod device;
pub use device::{
    find_loopback_device, list_devices, loopback_name, loopback_source, resolve_loopback,
    with_loopback_mirrors,
};

pub mod poller;
pub use poller::CompletionPoller;

pub mod signal;
pub use signal::Sawtooth;
