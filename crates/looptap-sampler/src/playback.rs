//! Stretch-then-play engine.

use std::sync::Arc;
use std::time::Instant;

use looptap_core::{
    AudioBackend, BufferSlot, LooptapConfig, PlaybackCallback, StreamParams, StreamStatus,
    TransportRequest, TransportState,
};

use crate::active::{close_stream, ActiveStream, PollOutcome};
use crate::time_stretch::{StretchReport, TimeStretchPipeline};
use crate::Result;

/// Result of a play request that passed the transport check.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Nothing recorded yet; no stream was opened.
    NothingRecorded,
    /// Output stream running over the stretched buffer.
    Started(StretchReport),
}

/// Plays the current buffer on the default output at the transport's speed.
///
/// Every play stretches whatever the slot holds, so repeated plays compound.
pub struct PlaybackEngine {
    backend: Arc<dyn AudioBackend>,
    transport: Arc<TransportState>,
    slot: Arc<BufferSlot>,
    pipeline: TimeStretchPipeline,
    frames_per_buffer: Option<u32>,
    active: ActiveStream,
}

impl PlaybackEngine {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        transport: Arc<TransportState>,
        slot: Arc<BufferSlot>,
        config: &LooptapConfig,
    ) -> Self {
        Self {
            backend,
            transport,
            slot,
            pipeline: TimeStretchPipeline::from_config(config),
            frames_per_buffer: config.frames_per_buffer,
            active: ActiveStream::new(config.poll_interval()),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_open()
    }

    pub fn is_polling(&self) -> bool {
        self.active.poller().is_running()
    }

    pub fn pipeline(&self) -> &TimeStretchPipeline {
        &self.pipeline
    }

    /// Stretch the recording and start playing it from frame 0.
    ///
    /// Requires `Idle`. If the stream cannot be opened or started the
    /// stretched buffer stays in the slot and the phase does not change.
    pub fn play(&mut self, now: Instant) -> Result<PlayOutcome> {
        self.transport.check(TransportRequest::BeginPlay)?;
        if self.slot.load().recorded_frames() == 0 {
            tracing::info!("nothing recorded, play ignored");
            return Ok(PlayOutcome::NothingRecorded);
        }
        self.active.reset_poller();

        let report = self
            .pipeline
            .run(&self.slot, self.transport.speed_ratio())?;
        let buffer = self.slot.load();
        buffer.rewind();

        let params = StreamParams {
            sample_rate: buffer.sample_rate(),
            channels: buffer.channels() as u16,
            frames_per_buffer: self.frames_per_buffer,
        };
        let callback = PlaybackCallback::new(Arc::clone(&buffer)).into_callback();
        let mut stream = self.backend.open_output(None, &params, callback)?;

        if let Err(err) = stream.start() {
            close_stream(stream);
            return Err(err.into());
        }
        if let Err(err) = self.transport.request(TransportRequest::BeginPlay) {
            close_stream(stream);
            return Err(err.into());
        }
        self.active.install(stream, now);

        tracing::info!(
            "playing {} frames at {}x ({} Hz)",
            report.output_frames,
            report.speed_ratio,
            params.sample_rate
        );
        Ok(PlayOutcome::Started(report))
    }

    /// Stop playback early. Returns the frames played.
    pub fn stop(&mut self) -> Result<usize> {
        self.transport.check(TransportRequest::EndPlay)?;
        self.active.close();
        self.transport.request(TransportRequest::EndPlay)?;
        let frames = self.slot.load().read_index();
        tracing::info!("playback stopped at {} frames", frames);
        Ok(frames)
    }

    pub fn poll(&mut self, now: Instant) -> PollOutcome {
        if !self.active.is_open() {
            return PollOutcome::Idle;
        }
        match self.active.due_status(now) {
            None => PollOutcome::NotDue,
            Some(StreamStatus::Active) => PollOutcome::Active,
            Some(StreamStatus::Finished) => {
                let frames = self.finish();
                tracing::info!("playback finished after {} frames", frames);
                PollOutcome::Finished { frames }
            }
            Some(StreamStatus::Errored(message)) => {
                let frames = self.finish();
                tracing::error!("playback stream failed after {} frames: {}", frames, message);
                PollOutcome::Errored {
                    frames,
                    error: looptap_core::Error::StreamRuntimeError(message),
                }
            }
        }
    }

    fn finish(&mut self) -> usize {
        self.active.close();
        if let Err(err) = self.transport.request(TransportRequest::EndPlay) {
            tracing::warn!("playback finished outside playing: {}", err);
        }
        self.slot.load().read_index()
    }
}
