//! Real-time capture and playback callbacks.
//!
//! Everything here runs on the audio thread: no allocation, no locks, no
//! blocking. A panic is caught and reported as [`CallbackFlow::Complete`] so
//! the host always gets a valid return signal.

use crate::backend::{InputCallback, OutputCallback};
use crate::buffer::AudioBuffer;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Signal returned to the host after every buffer period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFlow {
    Continue,
    Complete,
}

/// Append up to `frames_requested` frames of `input` to `buffer`.
///
/// `None` input records silence. Completes once the buffer is full.
#[inline]
pub fn capture_block(
    buffer: &AudioBuffer,
    input: Option<&[f32]>,
    frames_requested: usize,
) -> CallbackFlow {
    let frames = frames_requested.min(buffer.frames_free());
    buffer.append(input, frames);

    if buffer.frames_free() == 0 {
        CallbackFlow::Complete
    } else {
        CallbackFlow::Continue
    }
}

/// Fill `output` with up to `frames_requested` recorded frames, silence after.
///
/// Completes on the call where `read_index` reaches `recorded_frames`.
#[inline]
pub fn playback_block(
    buffer: &AudioBuffer,
    output: &mut [f32],
    frames_requested: usize,
) -> CallbackFlow {
    let channels = buffer.channels();
    let frames_requested = frames_requested.min(output.len() / channels);
    let frames_left = buffer.frames_unplayed();
    let frames = frames_requested.min(frames_left);

    buffer.drain_into(output, frames);
    output[frames * channels..].fill(0.0);

    if frames_left <= frames_requested {
        CallbackFlow::Complete
    } else {
        CallbackFlow::Continue
    }
}

/// Capture callback state handed to the input stream.
pub struct CaptureCallback {
    buffer: Arc<AudioBuffer>,
}

impl CaptureCallback {
    pub fn new(buffer: Arc<AudioBuffer>) -> Self {
        Self { buffer }
    }

    #[inline]
    pub fn process(&mut self, input: Option<&[f32]>, frames: usize) -> CallbackFlow {
        let buffer = &self.buffer;
        catch_unwind(AssertUnwindSafe(|| capture_block(buffer, input, frames)))
            .unwrap_or(CallbackFlow::Complete)
    }

    pub fn into_callback(mut self) -> InputCallback {
        Box::new(move |input, frames| self.process(input, frames))
    }
}

/// Playback callback state handed to the output stream.
pub struct PlaybackCallback {
    buffer: Arc<AudioBuffer>,
}

impl PlaybackCallback {
    pub fn new(buffer: Arc<AudioBuffer>) -> Self {
        Self { buffer }
    }

    #[inline]
    pub fn process(&mut self, output: &mut [f32], frames: usize) -> CallbackFlow {
        let buffer = &self.buffer;
        let result = catch_unwind(AssertUnwindSafe(|| playback_block(buffer, output, frames)));

        match result {
            Ok(flow) => flow,
            Err(_) => {
                // Panic in callback - output silence
                output.fill(0.0);
                CallbackFlow::Complete
            }
        }
    }

    pub fn into_callback(mut self) -> OutputCallback {
        Box::new(move |output, frames| self.process(output, frames))
    }
}
