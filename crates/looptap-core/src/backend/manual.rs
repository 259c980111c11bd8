//! Dummy backend with manual cycle control.
//!
//! The host supplies the device list and calls [`ManualBackend::pump_input`] /
//! [`ManualBackend::pump_output`] to run buffer periods on its own thread.

use super::{
    AudioBackend, AudioStream, DeviceInfo, InputCallback, OutputCallback, StreamMonitor,
    StreamParams, StreamStatus,
};
use crate::config::DEFAULT_LOOPBACK_MARKER;
use crate::device::with_loopback_mirrors;
use crate::lockfree::AtomicFlag;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

struct Slot<C> {
    id: u64,
    device: Option<DeviceInfo>,
    params: StreamParams,
    monitor: Arc<StreamMonitor>,
    started: Arc<AtomicFlag>,
    callback: C,
}

#[derive(Default)]
struct ManualState {
    devices: Vec<DeviceInfo>,
    default_output: Option<usize>,
    fail_next_open: Option<String>,
    fail_next_start: Option<String>,
    input: Option<Slot<InputCallback>>,
    output: Option<Slot<OutputCallback>>,
    next_id: u64,
    opened: usize,
    closed: usize,
}

/// Headless backend. Clones share the same devices and streams.
#[derive(Clone, Default)]
pub struct ManualBackend {
    state: Arc<Mutex<ManualState>>,
}

impl ManualBackend {
    /// Backend exposing `devices`; `default_output` indexes into the list.
    pub fn new(devices: Vec<DeviceInfo>, default_output: Option<usize>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                devices,
                default_output,
                ..Default::default()
            })),
        }
    }

    /// An output device and its loopback mirror, both at `sample_rate`.
    pub fn loopback_pair(output_name: &str, channels: u16, sample_rate: u32) -> Self {
        let devices = vec![DeviceInfo::output(0, output_name, channels, sample_rate)];
        Self::new(
            with_loopback_mirrors(devices, DEFAULT_LOOPBACK_MARKER),
            Some(0),
        )
    }

    pub fn set_devices(&self, devices: Vec<DeviceInfo>, default_output: Option<usize>) {
        let mut state = self.state.lock();
        state.devices = devices;
        state.default_output = default_output;
    }

    /// Make the next `open_input`/`open_output` call fail.
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.state.lock().fail_next_open = Some(message.into());
    }

    /// Make `start()` fail on the next stream opened.
    pub fn fail_next_start(&self, message: impl Into<String>) {
        self.state.lock().fail_next_start = Some(message.into());
    }

    /// Report a host error on every open stream.
    pub fn fail_active_streams(&self, message: &str) {
        let state = self.state.lock();
        if let Some(slot) = &state.input {
            slot.monitor.fail(message);
        }
        if let Some(slot) = &state.output {
            slot.monitor.fail(message);
        }
    }

    /// Run one capture period. Returns false when no started input is open.
    pub fn pump_input(&self, input: Option<&[f32]>, frames: usize) -> bool {
        let mut state = self.state.lock();
        match state.input.as_mut() {
            Some(slot) if slot.started.get() => {
                slot.monitor.drive_input(&mut slot.callback, input, frames);
                true
            }
            _ => false,
        }
    }

    /// Run one playback period and return the interleaved output.
    pub fn pump_output(&self, frames: usize) -> Option<Vec<f32>> {
        let mut state = self.state.lock();
        match state.output.as_mut() {
            Some(slot) if slot.started.get() => {
                let mut out = vec![0.0; frames * slot.params.channels as usize];
                slot.monitor.drive_output(&mut slot.callback, &mut out, frames);
                Some(out)
            }
            _ => None,
        }
    }

    pub fn has_open_input(&self) -> bool {
        self.state.lock().input.is_some()
    }

    pub fn has_open_output(&self) -> bool {
        self.state.lock().output.is_some()
    }

    /// Params and device of the open capture stream.
    pub fn input_stream(&self) -> Option<(DeviceInfo, StreamParams)> {
        let state = self.state.lock();
        let slot = state.input.as_ref()?;
        Some((slot.device.clone()?, slot.params))
    }

    pub fn output_params(&self) -> Option<StreamParams> {
        self.state.lock().output.as_ref().map(|slot| slot.params)
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().opened
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().closed
    }

    fn prepare_open(state: &mut ManualState) -> Result<(u64, Option<String>)> {
        if let Some(message) = state.fail_next_open.take() {
            return Err(Error::StreamOpenFailed(message));
        }
        state.next_id += 1;
        state.opened += 1;
        Ok((state.next_id, state.fail_next_start.take()))
    }
}

impl AudioBackend for ManualBackend {
    fn devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.state.lock().devices.clone())
    }

    fn default_output_device(&self) -> Result<Option<DeviceInfo>> {
        let state = self.state.lock();
        Ok(state
            .default_output
            .and_then(|idx| state.devices.get(idx).cloned()))
    }

    fn open_input(
        &self,
        device: &DeviceInfo,
        params: &StreamParams,
        callback: InputCallback,
    ) -> Result<Box<dyn AudioStream>> {
        let mut state = self.state.lock();
        if !state.devices.iter().any(|d| d == device && d.is_input()) {
            return Err(Error::StreamOpenFailed(format!(
                "'{}' is not an input device",
                device.name
            )));
        }
        if state.input.is_some() {
            return Err(Error::StreamOpenFailed("input stream already open".into()));
        }
        let (id, fail_start) = Self::prepare_open(&mut state)?;

        let monitor = Arc::new(StreamMonitor::new());
        let started = Arc::new(AtomicFlag::new(false));
        state.input = Some(Slot {
            id,
            device: Some(device.clone()),
            params: *params,
            monitor: Arc::clone(&monitor),
            started: Arc::clone(&started),
            callback,
        });

        Ok(Box::new(ManualStream {
            id,
            direction: Direction::Input,
            monitor,
            started,
            fail_start,
            state: Arc::clone(&self.state),
        }))
    }

    fn open_output(
        &self,
        device: Option<&DeviceInfo>,
        params: &StreamParams,
        callback: OutputCallback,
    ) -> Result<Box<dyn AudioStream>> {
        let mut state = self.state.lock();
        let device = match device {
            Some(device) => Some(device.clone()),
            None => state
                .default_output
                .and_then(|idx| state.devices.get(idx).cloned()),
        };
        if device.is_none() {
            return Err(Error::StreamOpenFailed("no output device".into()));
        }
        if state.output.is_some() {
            return Err(Error::StreamOpenFailed("output stream already open".into()));
        }
        let (id, fail_start) = Self::prepare_open(&mut state)?;

        let monitor = Arc::new(StreamMonitor::new());
        let started = Arc::new(AtomicFlag::new(false));
        state.output = Some(Slot {
            id,
            device,
            params: *params,
            monitor: Arc::clone(&monitor),
            started: Arc::clone(&started),
            callback,
        });

        Ok(Box::new(ManualStream {
            id,
            direction: Direction::Output,
            monitor,
            started,
            fail_start,
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Input,
    Output,
}

struct ManualStream {
    id: u64,
    direction: Direction,
    monitor: Arc<StreamMonitor>,
    started: Arc<AtomicFlag>,
    fail_start: Option<String>,
    state: Arc<Mutex<ManualState>>,
}

impl AudioStream for ManualStream {
    fn start(&mut self) -> Result<()> {
        if let Some(message) = self.fail_start.take() {
            return Err(Error::StreamStartFailed(message));
        }
        self.started.set(true);
        Ok(())
    }

    fn status(&self) -> StreamStatus {
        self.monitor.status()
    }

    fn close(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock();
        match self.direction {
            Direction::Input => {
                if state.input.as_ref().is_some_and(|s| s.id == self.id) {
                    state.input = None;
                }
            }
            Direction::Output => {
                if state.output.as_ref().is_some_and(|s| s.id == self.id) {
                    state.output = None;
                }
            }
        }
        state.closed += 1;
        Ok(())
    }
}
