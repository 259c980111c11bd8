//! Audio subsystem boundary.
//!
//! Engines talk to devices through [`AudioBackend`] and hold open streams as
//! `Box<dyn AudioStream>`. [`CpalBackend`] drives real hardware;
//! [`ManualBackend`] is a dummy backend with manual cycle control for headless
//! hosts and tests.

#[cfg(feature = "hardware")]
mod cpal_backend;
mod manual;

#[cfg(feature = "hardware")]
pub use cpal_backend::CpalBackend;
pub use manual::ManualBackend;

use crate::callback::CallbackFlow;
use crate::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

/// One entry of the host's device enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Position in enumeration order
    pub index: usize,
    pub name: String,
    pub input_channels: u16,
    pub output_channels: u16,
    /// Native rate; 0 when the host does not report one
    pub default_sample_rate: u32,
}

impl DeviceInfo {
    pub fn input(index: usize, name: impl Into<String>, channels: u16, sample_rate: u32) -> Self {
        Self {
            index,
            name: name.into(),
            input_channels: channels,
            output_channels: 0,
            default_sample_rate: sample_rate,
        }
    }

    pub fn output(index: usize, name: impl Into<String>, channels: u16, sample_rate: u32) -> Self {
        Self {
            index,
            name: name.into(),
            input_channels: 0,
            output_channels: channels,
            default_sample_rate: sample_rate,
        }
    }

    pub fn is_input(&self) -> bool {
        self.input_channels > 0
    }

    pub fn is_output(&self) -> bool {
        self.output_channels > 0
    }
}

/// Parameters for opening a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub sample_rate: u32,
    pub channels: u16,
    /// `None` lets the host pick the buffer period.
    pub frames_per_buffer: Option<u32>,
}

/// Capture callback: interleaved input (or `None`) and the frame count.
pub type InputCallback = Box<dyn FnMut(Option<&[f32]>, usize) -> CallbackFlow + Send + 'static>;

/// Playback callback: interleaved output to fill and the frame count.
pub type OutputCallback = Box<dyn FnMut(&mut [f32], usize) -> CallbackFlow + Send + 'static>;

/// What the completion poller sees when it checks a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Active,
    Finished,
    Errored(String),
}

/// A device enumerator and stream factory.
pub trait AudioBackend: Send + Sync {
    fn devices(&self) -> Result<Vec<DeviceInfo>>;

    fn default_output_device(&self) -> Result<Option<DeviceInfo>>;

    /// Open a capture stream on `device`. The stream is not started.
    fn open_input(
        &self,
        device: &DeviceInfo,
        params: &StreamParams,
        callback: InputCallback,
    ) -> Result<Box<dyn AudioStream>>;

    /// Open a playback stream on `device`, or the default output when `None`.
    fn open_output(
        &self,
        device: Option<&DeviceInfo>,
        params: &StreamParams,
        callback: OutputCallback,
    ) -> Result<Box<dyn AudioStream>>;
}

/// An open stream, owned by exactly one engine.
pub trait AudioStream: Send {
    fn start(&mut self) -> Result<()>;

    fn status(&self) -> StreamStatus;

    /// Stop and release the stream. Consumes the handle so it closes once.
    fn close(self: Box<Self>) -> Result<()>;
}

const ACTIVE: u8 = 0;
const FINISHED: u8 = 1;
const ERRORED: u8 = 2;

/// Stream status shared between the audio thread and the poller.
///
/// Moves from active to finished or errored exactly once.
#[derive(Debug)]
pub struct StreamMonitor {
    state: AtomicU8,
    error: Mutex<Option<String>>,
}

impl StreamMonitor {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ACTIVE),
            error: Mutex::new(None),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::Acquire) == ACTIVE
    }

    /// Mark the stream drained. Returns false if it already ended.
    #[inline]
    pub fn finish(&self) -> bool {
        self.state
            .compare_exchange(ACTIVE, FINISHED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record a host error. Ignored once the stream has ended.
    pub fn fail(&self, message: impl Into<String>) {
        if let Some(mut slot) = self.error.try_lock() {
            if self
                .state
                .compare_exchange(ACTIVE, ERRORED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                *slot = Some(message.into());
            }
        }
    }

    pub fn status(&self) -> StreamStatus {
        match self.state.load(Ordering::Acquire) {
            ACTIVE => StreamStatus::Active,
            FINISHED => StreamStatus::Finished,
            _ => StreamStatus::Errored(
                self.error
                    .lock()
                    .clone()
                    .unwrap_or_else(|| "unknown stream error".to_string()),
            ),
        }
    }

    /// Run one capture period. The callback is skipped once the stream ended.
    #[inline]
    pub fn drive_input(
        &self,
        callback: &mut InputCallback,
        input: Option<&[f32]>,
        frames: usize,
    ) {
        if !self.is_active() {
            return;
        }
        if callback(input, frames) == CallbackFlow::Complete {
            self.finish();
        }
    }

    /// Run one playback period. Outputs silence once the stream ended.
    #[inline]
    pub fn drive_output(&self, callback: &mut OutputCallback, output: &mut [f32], frames: usize) {
        if !self.is_active() {
            output.fill(0.0);
            return;
        }
        if callback(output, frames) == CallbackFlow::Complete {
            self.finish();
        }
    }
}

impl Default for StreamMonitor {
    fn default() -> Self {
        Self::new()
    }
}
