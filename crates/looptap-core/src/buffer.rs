//! Linear PCM store shared by capture, stretch, playback and the renderer.
//!
//! Samples are interleaved (`channels` consecutive values per frame). Every
//! sample and index is an atomic, so the renderer may read the span written so
//! far while a real-time callback keeps appending to it. Only one callback is
//! ever armed against a buffer at a time; the transport enforces that.

use crate::{Error, Result};
use arc_swap::ArcSwap;
use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed-capacity interleaved sample store plus its positional indices.
#[derive(Debug)]
pub struct AudioBuffer {
    samples: Box<[AtomicF32]>,
    channels: usize,
    capacity_frames: usize,
    sample_rate: u32,
    write_index: AtomicUsize,
    read_index: AtomicUsize,
    recorded_frames: AtomicUsize,
    last_rendered: AtomicUsize,
}

fn alloc_samples(frames: usize, channels: usize) -> Result<Vec<AtomicF32>> {
    let len = frames
        .checked_mul(channels)
        .ok_or(Error::AllocationFailed { frames })?;
    let mut samples = Vec::new();
    samples
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed { frames })?;
    samples.extend((0..len).map(|_| AtomicF32::new(0.0)));
    Ok(samples)
}

impl AudioBuffer {
    /// Allocate a zero-filled buffer holding `capacity_frames` frames.
    pub fn with_capacity(capacity_frames: usize, channels: usize, sample_rate: u32) -> Result<Self> {
        let channels = channels.max(1);
        let samples = alloc_samples(capacity_frames, channels)?;

        Ok(Self {
            samples: samples.into_boxed_slice(),
            channels,
            capacity_frames,
            sample_rate,
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
            recorded_frames: AtomicUsize::new(0),
            last_rendered: AtomicUsize::new(0),
        })
    }

    /// Interleave per-channel arrays into a new, fully recorded buffer.
    ///
    /// Channels shorter than the longest one are padded with silence.
    pub fn from_planar<C: AsRef<[f32]>>(planar: &[C], sample_rate: u32) -> Result<Self> {
        let channels = planar.len().max(1);
        let frames = planar.iter().map(|c| c.as_ref().len()).max().unwrap_or(0);
        let buffer = Self::with_capacity(frames, channels, sample_rate)?;

        for (ch, data) in planar.iter().enumerate() {
            for (frame, &value) in data.as_ref().iter().enumerate() {
                buffer.samples[frame * channels + ch].store(value, Ordering::Relaxed);
            }
        }
        buffer.write_index.store(frames, Ordering::Release);
        buffer.recorded_frames.store(frames, Ordering::Release);
        Ok(buffer)
    }

    /// Build a fully recorded buffer from interleaved samples.
    pub fn from_interleaved(samples: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        let channels = channels.max(1);
        let frames = samples.len() / channels;
        let buffer = Self::with_capacity(frames, channels, sample_rate)?;
        for (slot, &value) in buffer.samples.iter().zip(samples) {
            slot.store(value, Ordering::Relaxed);
        }
        buffer.write_index.store(frames, Ordering::Release);
        buffer.recorded_frames.store(frames, Ordering::Release);
        Ok(buffer)
    }

    /// De-interleave the recorded span into one array per channel.
    pub fn to_planar(&self) -> Result<Vec<Vec<f32>>> {
        let frames = self.recorded_frames();
        let mut planar = Vec::with_capacity(self.channels);
        for ch in 0..self.channels {
            let mut data = Vec::new();
            data.try_reserve_exact(frames)
                .map_err(|_| Error::AllocationFailed { frames })?;
            data.extend((0..frames).map(|frame| self.sample(frame, ch)));
            planar.push(data);
        }
        Ok(planar)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn capacity_frames(&self) -> usize {
        self.capacity_frames
    }

    /// Rate the contents were captured or produced at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn write_index(&self) -> usize {
        self.write_index.load(Ordering::Acquire)
    }

    #[inline]
    pub fn read_index(&self) -> usize {
        self.read_index.load(Ordering::Acquire)
    }

    #[inline]
    pub fn recorded_frames(&self) -> usize {
        self.recorded_frames.load(Ordering::Acquire)
    }

    /// Renderer cursor. Never consulted by the engines.
    pub fn last_rendered(&self) -> usize {
        self.last_rendered.load(Ordering::Acquire)
    }

    pub fn set_last_rendered(&self, frame: usize) {
        self.last_rendered.store(frame, Ordering::Release);
    }

    /// Sample at `frame` on `channel`, or silence outside the buffer.
    #[inline]
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        if channel >= self.channels {
            return 0.0;
        }
        self.samples
            .get(frame * self.channels + channel)
            .map_or(0.0, |s| s.load(Ordering::Relaxed))
    }

    /// Record `write_index` as the valid length. Called once capture has stopped.
    pub fn commit_recorded(&self) -> usize {
        let frames = self.write_index().min(self.capacity_frames);
        self.recorded_frames.store(frames, Ordering::Release);
        frames
    }

    /// Move the playback position back to the first frame.
    pub fn rewind(&self) {
        self.read_index.store(0, Ordering::Release);
    }

    /// Frames left before the buffer is full.
    #[inline]
    pub(crate) fn frames_free(&self) -> usize {
        self.capacity_frames
            .saturating_sub(self.write_index.load(Ordering::Relaxed))
    }

    /// Frames left before playback reaches the recorded end.
    #[inline]
    pub(crate) fn frames_unplayed(&self) -> usize {
        self.recorded_frames
            .load(Ordering::Acquire)
            .saturating_sub(self.read_index.load(Ordering::Relaxed))
    }

    /// Append `frames` frames from `input` (interleaved) at `write_index`,
    /// or silence when `input` is `None`.
    ///
    /// Caller clamps `frames` to [`frames_free`](Self::frames_free).
    #[inline]
    pub(crate) fn append(&self, input: Option<&[f32]>, frames: usize) {
        let start = self.write_index.load(Ordering::Relaxed);
        let base = start * self.channels;
        let len = frames * self.channels;
        let dest = &self.samples[base..base + len];

        match input {
            Some(src) => {
                for (i, slot) in dest.iter().enumerate() {
                    slot.store(src.get(i).copied().unwrap_or(0.0), Ordering::Relaxed);
                }
            }
            None => {
                for slot in dest {
                    slot.store(0.0, Ordering::Relaxed);
                }
            }
        }
        self.write_index.store(start + frames, Ordering::Release);
    }

    /// Copy `frames` frames starting at `read_index` into `output` and advance.
    ///
    /// Caller clamps `frames` to [`frames_unplayed`](Self::frames_unplayed).
    #[inline]
    pub(crate) fn drain_into(&self, output: &mut [f32], frames: usize) {
        let start = self.read_index.load(Ordering::Relaxed);
        let base = start * self.channels;
        let len = frames * self.channels;
        for (out, slot) in output[..len].iter_mut().zip(&self.samples[base..base + len]) {
            *out = slot.load(Ordering::Relaxed);
        }
        self.read_index.store(start + frames, Ordering::Release);
    }
}

/// The current buffer, replaced wholesale, never resized in place.
///
/// Holders of a loaded `Arc` keep the old buffer alive until they drop it.
#[derive(Debug)]
pub struct BufferSlot {
    current: ArcSwap<AudioBuffer>,
}

impl BufferSlot {
    pub fn new(buffer: AudioBuffer) -> Self {
        Self {
            current: ArcSwap::from_pointee(buffer),
        }
    }

    pub fn load(&self) -> Arc<AudioBuffer> {
        self.current.load_full()
    }

    /// Swap in `buffer` and hand back the previous one.
    pub fn replace(&self, buffer: AudioBuffer) -> Arc<AudioBuffer> {
        self.current.swap(Arc::new(buffer))
    }

    pub fn replace_arc(&self, buffer: Arc<AudioBuffer>) -> Arc<AudioBuffer> {
        self.current.swap(buffer)
    }
}
