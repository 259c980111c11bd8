//! Loopback capture engine.

use std::sync::Arc;
use std::time::Instant;

use looptap_core::{
    find_loopback_device, AudioBackend, AudioBuffer, BufferSlot, CaptureCallback, DeviceInfo,
    LooptapConfig, StreamParams, StreamStatus, TransportRequest, TransportState,
};

use crate::active::{close_stream, ActiveStream, PollOutcome};
use crate::Result;

/// Details of a capture that just started.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureStarted {
    pub device: DeviceInfo,
    /// Rate the input stream was opened at.
    pub sample_rate: u32,
    pub capacity_frames: usize,
}

/// Records the default output's loopback mirror into a fresh buffer.
pub struct CaptureEngine {
    backend: Arc<dyn AudioBackend>,
    transport: Arc<TransportState>,
    slot: Arc<BufferSlot>,
    config: LooptapConfig,
    active: ActiveStream,
    device: Option<DeviceInfo>,
}

impl CaptureEngine {
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
            config: config.clone(),
            active: ActiveStream::new(config.poll_interval()),
            device: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_open()
    }

    pub fn is_polling(&self) -> bool {
        self.active.poller().is_running()
    }

    /// Device of the running or most recent capture.
    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Begin recording into a new zero-filled buffer.
    ///
    /// Requires `Idle`. On failure the stream is closed, the current buffer
    /// is untouched and the phase does not change.
    pub fn start(&mut self, now: Instant) -> Result<CaptureStarted> {
        self.transport.check(TransportRequest::BeginRecord)?;
        self.active.reset_poller();

        let channels = self.config.channels;
        let capacity_frames = self.config.capacity_frames();
        let buffer = Arc::new(AudioBuffer::with_capacity(
            capacity_frames,
            channels as usize,
            self.config.sample_rate,
        )?);

        let device = find_loopback_device(self.backend.as_ref(), &self.config.loopback_marker)?;
        let sample_rate = match device.default_sample_rate {
            0 => self.config.sample_rate,
            rate => rate,
        };
        if sample_rate != self.config.sample_rate {
            tracing::warn!(
                "'{}' runs at {} Hz, playback uses {} Hz",
                device.name,
                sample_rate,
                self.config.sample_rate
            );
        }

        let params = StreamParams {
            sample_rate,
            channels,
            frames_per_buffer: self.config.frames_per_buffer,
        };
        let callback = CaptureCallback::new(Arc::clone(&buffer)).into_callback();
        let mut stream = self.backend.open_input(&device, &params, callback)?;

        if let Err(err) = stream.start() {
            close_stream(stream);
            return Err(err.into());
        }
        if let Err(err) = self.transport.request(TransportRequest::BeginRecord) {
            close_stream(stream);
            return Err(err.into());
        }

        self.slot.replace_arc(buffer);
        self.active.install(stream, now);
        self.device = Some(device.clone());

        tracing::info!(
            "recording from {}: {} ({} Hz, {} frames max)",
            device.index,
            device.name,
            sample_rate,
            capacity_frames
        );
        Ok(CaptureStarted {
            device,
            sample_rate,
            capacity_frames,
        })
    }

    /// Stop recording early. Returns the frames kept.
    pub fn stop(&mut self) -> Result<usize> {
        self.transport.check(TransportRequest::EndRecord)?;
        let frames = self.teardown();
        self.transport.request(TransportRequest::EndRecord)?;
        tracing::info!("recording stopped at {} frames", frames);
        Ok(frames)
    }

    /// Completion check; call from the event loop at any cadence.
    pub fn poll(&mut self, now: Instant) -> PollOutcome {
        if !self.active.is_open() {
            return PollOutcome::Idle;
        }
        match self.active.due_status(now) {
            None => PollOutcome::NotDue,
            Some(StreamStatus::Active) => PollOutcome::Active,
            Some(StreamStatus::Finished) => {
                let frames = self.finish();
                tracing::info!("recording buffer full at {} frames", frames);
                PollOutcome::Finished { frames }
            }
            Some(StreamStatus::Errored(message)) => {
                let frames = self.finish();
                tracing::error!("capture stream failed after {} frames: {}", frames, message);
                PollOutcome::Errored {
                    frames,
                    error: looptap_core::Error::StreamRuntimeError(message),
                }
            }
        }
    }

    fn finish(&mut self) -> usize {
        let frames = self.teardown();
        if let Err(err) = self.transport.request(TransportRequest::EndRecord) {
            tracing::warn!("capture finished outside recording: {}", err);
        }
        frames
    }

    /// Close the stream and commit `recorded_frames = write_index`.
    fn teardown(&mut self) -> usize {
        self.active.close();
        self.slot.load().commit_recorded()
    }
}
