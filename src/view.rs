//! Read-only window onto the recorder for a waveform renderer.
//!
//! Indices may move between calls while a stream runs; each call reads
//! whatever is visible at that moment.

use std::ops::Range;
use std::sync::Arc;

use looptap_core::{AudioBuffer, BufferSlot, Phase, TransportState};

#[derive(Clone)]
pub struct RenderView {
    transport: Arc<TransportState>,
    slot: Arc<BufferSlot>,
}

impl RenderView {
    pub(crate) fn new(transport: Arc<TransportState>, slot: Arc<BufferSlot>) -> Self {
        Self { transport, slot }
    }

    pub fn phase(&self) -> Phase {
        self.transport.phase()
    }

    pub fn speed_ratio(&self) -> f64 {
        self.transport.speed_ratio()
    }

    /// The buffer currently in the slot.
    pub fn buffer(&self) -> Arc<AudioBuffer> {
        self.slot.load()
    }

    pub fn channels(&self) -> usize {
        self.slot.load().channels()
    }

    pub fn sample_rate(&self) -> u32 {
        self.slot.load().sample_rate()
    }

    pub fn capacity_frames(&self) -> usize {
        self.slot.load().capacity_frames()
    }

    pub fn write_index(&self) -> usize {
        self.slot.load().write_index()
    }

    pub fn read_index(&self) -> usize {
        self.slot.load().read_index()
    }

    pub fn recorded_frames(&self) -> usize {
        self.slot.load().recorded_frames()
    }

    /// Frame the renderer should draw up to.
    ///
    /// Recording: the write index. Playing: the read index. Idle: the whole
    /// recording.
    pub fn live_index(&self) -> usize {
        let buffer = self.slot.load();
        match self.transport.phase() {
            Phase::Recording => buffer.write_index(),
            Phase::Playing => buffer.read_index(),
            Phase::Idle => buffer.recorded_frames(),
        }
    }

    /// Frames not drawn yet, from the redraw cursor up to [`live_index`].
    ///
    /// A cursor past the live index (new buffer swapped in) restarts at 0.
    ///
    /// [`live_index`]: RenderView::live_index
    pub fn pending_span(&self) -> Range<usize> {
        let live = self.live_index();
        let cursor = self.slot.load().last_rendered();
        if cursor > live {
            0..live
        } else {
            cursor..live
        }
    }

    pub fn mark_rendered(&self, frame: usize) {
        self.slot.load().set_last_rendered(frame);
    }

    /// Force a full redraw, e.g. after a resize.
    pub fn reset_cursor(&self) {
        self.slot.load().set_last_rendered(0);
    }

    /// Position marker in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        let buffer = self.slot.load();
        let (pos, total) = match self.transport.phase() {
            Phase::Recording => (buffer.write_index(), buffer.capacity_frames()),
            Phase::Playing => (buffer.read_index(), buffer.recorded_frames()),
            Phase::Idle => return 0.0,
        };
        if total == 0 {
            return 0.0;
        }
        (pos as f64 / total as f64).min(1.0)
    }

    /// One channel over `frames`, clamped to the buffer's capacity.
    pub fn channel_samples(&self, channel: usize, frames: Range<usize>) -> Vec<f32> {
        let buffer = self.slot.load();
        if channel >= buffer.channels() {
            return Vec::new();
        }
        let end = frames.end.min(buffer.capacity_frames());
        let start = frames.start.min(end);
        (start..end).map(|frame| buffer.sample(frame, channel)).collect()
    }
}
