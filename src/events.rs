//! Notifications for the host's UI.

/// Why a capture or playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `end_record` / `end_play` or a toggle.
    User,
    /// Buffer filled (capture) or drained (playback).
    Completed,
    /// The host reported a stream error.
    Errored,
}

/// Emitted by [`LooptapEngine`](crate::LooptapEngine) on every phase change
/// and on poller ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    RecordStarted {
        device: String,
        capacity_frames: usize,
    },
    RecordStopped {
        frames: usize,
        reason: StopReason,
    },
    PlayStarted {
        frames: usize,
        speed_ratio: f64,
    },
    /// A play request found an empty recording.
    NothingToPlay,
    PlayStopped {
        frames: usize,
        reason: StopReason,
    },
    /// Stream still running; the waveform or position marker moved.
    Redraw,
    /// Host diagnostic, sent just before the matching stop event.
    StreamError(String),
}
