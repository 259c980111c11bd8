//! LooptapEngine: routes user actions and poller ticks to the capture and
//! playback engines.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use looptap_core::{AudioBackend, AudioBuffer, BufferSlot, LooptapConfig, Phase, TransportState};
use looptap_sampler::{CaptureEngine, CaptureStarted, PlayOutcome, PlaybackEngine, PollOutcome};

use crate::events::{EngineEvent, StopReason};
use crate::view::RenderView;
use crate::{LooptapEngineBuilder, Result};

/// Events held for a host that is not draining [`LooptapEngine::events`].
pub const EVENT_QUEUE_CAPACITY: usize = 512;

/// Queue depth past which `Redraw` ticks are dropped, leaving room for
/// state changes.
const REDRAW_HIGH_WATER: usize = EVENT_QUEUE_CAPACITY / 2;

/// A user request, as issued by the record/play buttons and speed slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    BeginRecord,
    EndRecord,
    BeginPlay,
    EndPlay,
    ToggleRecord,
    TogglePlay,
    SetSpeedRatio(f64),
}

/// Loopback recorder.
///
/// Owns the shared transport and buffer slot and hands them to a capture and
/// a playback engine. All methods run on the host's event loop; only the
/// stream callbacks run on the audio thread.
///
/// # Example
///
/// ```ignore
/// use looptap::prelude::*;
///
/// let mut engine = LooptapEngine::builder().max_record_secs(5.0).build()?;
/// let events = engine.events();
///
/// engine.begin_record(Instant::now())?;
/// loop {
///     std::thread::sleep(engine.poll_interval());
///     engine.poll(Instant::now());
///     for event in events.try_iter() {
///         println!("{:?}", event);
///     }
/// }
/// ```
pub struct LooptapEngine {
    config: LooptapConfig,
    backend: Arc<dyn AudioBackend>,
    transport: Arc<TransportState>,
    slot: Arc<BufferSlot>,
    capture: CaptureEngine,
    playback: PlaybackEngine,
    events_tx: Sender<EngineEvent>,
    events_rx: Receiver<EngineEvent>,
}

impl LooptapEngine {
    pub fn builder() -> LooptapEngineBuilder {
        LooptapEngineBuilder::default()
    }

    pub(crate) fn new(config: LooptapConfig, backend: Arc<dyn AudioBackend>) -> Result<Self> {
        let transport = Arc::new(TransportState::new(
            config.min_speed_ratio,
            config.max_speed_ratio,
        ));
        let slot = Arc::new(BufferSlot::new(AudioBuffer::with_capacity(
            config.capacity_frames(),
            config.channels as usize,
            config.sample_rate,
        )?));
        let capture = CaptureEngine::new(
            Arc::clone(&backend),
            Arc::clone(&transport),
            Arc::clone(&slot),
            &config,
        );
        let playback = PlaybackEngine::new(
            Arc::clone(&backend),
            Arc::clone(&transport),
            Arc::clone(&slot),
            &config,
        );
        let (events_tx, events_rx) = crossbeam_channel::bounded(EVENT_QUEUE_CAPACITY);

        tracing::debug!(
            "looptap engine ready: {} Hz, {} ch, {} frames max",
            config.sample_rate,
            config.channels,
            config.capacity_frames()
        );
        Ok(Self {
            config,
            backend,
            transport,
            slot,
            capture,
            playback,
            events_tx,
            events_rx,
        })
    }

    pub fn config(&self) -> &LooptapConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.transport.phase()
    }

    pub fn transport(&self) -> &Arc<TransportState> {
        &self.transport
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    pub fn view(&self) -> RenderView {
        RenderView::new(Arc::clone(&self.transport), Arc::clone(&self.slot))
    }

    /// Receiver of engine notifications. All clones share one queue.
    pub fn events(&self) -> Receiver<EngineEvent> {
        self.events_rx.clone()
    }

    /// One line per device, for diagnostics.
    pub fn list_devices(&self) -> Result<Vec<String>> {
        Ok(looptap_core::list_devices(self.backend.as_ref())?)
    }

    pub fn begin_record(&mut self, now: Instant) -> Result<CaptureStarted> {
        let started = self.capture.start(now)?;
        self.emit(EngineEvent::RecordStarted {
            device: started.device.name.clone(),
            capacity_frames: started.capacity_frames,
        });
        Ok(started)
    }

    /// Returns the frames kept.
    pub fn end_record(&mut self) -> Result<usize> {
        let frames = self.capture.stop()?;
        self.emit(EngineEvent::RecordStopped {
            frames,
            reason: StopReason::User,
        });
        Ok(frames)
    }

    pub fn begin_play(&mut self, now: Instant) -> Result<PlayOutcome> {
        let outcome = self.playback.play(now)?;
        match &outcome {
            PlayOutcome::NothingRecorded => self.emit(EngineEvent::NothingToPlay),
            PlayOutcome::Started(report) => self.emit(EngineEvent::PlayStarted {
                frames: report.output_frames,
                speed_ratio: report.speed_ratio,
            }),
        }
        Ok(outcome)
    }

    /// Returns the frames played.
    pub fn end_play(&mut self) -> Result<usize> {
        let frames = self.playback.stop()?;
        self.emit(EngineEvent::PlayStopped {
            frames,
            reason: StopReason::User,
        });
        Ok(frames)
    }

    /// Stored for the next play; a running playback keeps its speed.
    pub fn set_speed_ratio(&self, ratio: f64) -> Result<()> {
        self.transport.set_speed_ratio(ratio)?;
        tracing::debug!(
            "speed ratio {} (effective {})",
            ratio,
            self.transport.effective_speed_ratio()
        );
        Ok(())
    }

    /// Record button: stops a running capture, otherwise starts one.
    pub fn toggle_record(&mut self, now: Instant) -> Result<()> {
        if self.transport.phase() == Phase::Recording {
            self.end_record()?;
        } else {
            self.begin_record(now)?;
        }
        Ok(())
    }

    /// Play button: stops a running playback, otherwise starts one.
    pub fn toggle_play(&mut self, now: Instant) -> Result<()> {
        if self.transport.phase() == Phase::Playing {
            self.end_play()?;
        } else {
            self.begin_play(now)?;
        }
        Ok(())
    }

    pub fn dispatch(&mut self, action: Action, now: Instant) -> Result<()> {
        match action {
            Action::BeginRecord => self.begin_record(now).map(drop),
            Action::EndRecord => self.end_record().map(drop),
            Action::BeginPlay => self.begin_play(now).map(drop),
            Action::EndPlay => self.end_play().map(drop),
            Action::ToggleRecord => self.toggle_record(now),
            Action::TogglePlay => self.toggle_play(now),
            Action::SetSpeedRatio(ratio) => self.set_speed_ratio(ratio),
        }
    }

    /// Completion check for whichever stream is open. Call at least every
    /// [`poll_interval`](Self::poll_interval).
    pub fn poll(&mut self, now: Instant) -> PollOutcome {
        let outcome = self.capture.poll(now);
        if outcome != PollOutcome::Idle {
            self.emit_poll(&outcome, |frames, reason| EngineEvent::RecordStopped {
                frames,
                reason,
            });
            return outcome;
        }
        let outcome = self.playback.poll(now);
        self.emit_poll(&outcome, |frames, reason| EngineEvent::PlayStopped {
            frames,
            reason,
        });
        outcome
    }

    fn emit_poll(&self, outcome: &PollOutcome, stopped: fn(usize, StopReason) -> EngineEvent) {
        match outcome {
            PollOutcome::Idle | PollOutcome::NotDue => {}
            PollOutcome::Active => self.emit(EngineEvent::Redraw),
            PollOutcome::Finished { frames } => {
                self.emit(stopped(*frames, StopReason::Completed));
            }
            PollOutcome::Errored { frames, error } => {
                self.emit(EngineEvent::StreamError(error.to_string()));
                self.emit(stopped(*frames, StopReason::Errored));
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        if event == EngineEvent::Redraw && self.events_tx.len() >= REDRAW_HIGH_WATER {
            return;
        }
        // Full queue: nobody is listening, drop rather than block the loop.
        if let Err(err) = self.events_tx.try_send(event) {
            tracing::trace!("event queue full, dropped {:?}", err.into_inner());
        }
    }
}
