//! The stream an engine currently owns, plus its completion poller.

use std::time::{Duration, Instant};

use looptap_core::{AudioStream, CompletionPoller, StreamStatus};

/// What an engine's `poll` observed.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// No stream open.
    Idle,
    /// Stream open, check not due yet.
    NotDue,
    /// Stream still running. For capture this doubles as a redraw tick.
    Active,
    /// Stream drained; the engine tore it down and went idle.
    Finished { frames: usize },
    /// Stream failed; torn down like `Finished`, with the host's diagnostic.
    Errored {
        frames: usize,
        error: looptap_core::Error,
    },
}

pub(crate) struct ActiveStream {
    stream: Option<Box<dyn AudioStream>>,
    poller: CompletionPoller,
}

impl ActiveStream {
    pub(crate) fn new(poll_interval: Duration) -> Self {
        Self {
            stream: None,
            poller: CompletionPoller::new(poll_interval),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub(crate) fn poller(&self) -> &CompletionPoller {
        &self.poller
    }

    /// Stop a poller left over from an earlier cycle.
    pub(crate) fn reset_poller(&mut self) {
        self.poller.stop();
    }

    pub(crate) fn install(&mut self, stream: Box<dyn AudioStream>, now: Instant) {
        self.stream = Some(stream);
        self.poller.start(now);
    }

    /// Stream status if a check is due.
    pub(crate) fn due_status(&mut self, now: Instant) -> Option<StreamStatus> {
        let stream = self.stream.as_ref()?;
        if !self.poller.due(now) {
            return None;
        }
        Some(stream.status())
    }

    /// Stop the poller and close the stream, if any.
    pub(crate) fn close(&mut self) {
        self.poller.stop();
        if let Some(stream) = self.stream.take() {
            close_stream(stream);
        }
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Close a stream, logging rather than propagating a failure.
pub(crate) fn close_stream(stream: Box<dyn AudioStream>) {
    if let Err(err) = stream.close() {
        tracing::warn!("closing audio stream failed: {}", err);
    }
}
