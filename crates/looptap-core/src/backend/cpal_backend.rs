//! CPAL host backend.

use super::{
    AudioBackend, AudioStream, DeviceInfo, InputCallback, OutputCallback, StreamMonitor,
    StreamParams, StreamStatus,
};
use crate::config::DEFAULT_LOOPBACK_MARKER;
use crate::device::{loopback_source, with_loopback_mirrors};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;

/// Frames converted per pass for devices with non-f32 sample formats.
const SCRATCH_FRAMES: usize = 1024;

/// Whether the host captures an output device by opening it as an input
/// (WASAPI loopback).
const HOST_LOOPBACK: bool = cfg!(target_os = "windows");

/// Backend over the platform's default CPAL host.
///
/// On loopback-capable hosts every output device gets a mirror input entry
/// named `"<output> <marker>"`; opening that entry captures the output.
#[derive(Debug, Clone)]
pub struct CpalBackend {
    loopback_marker: String,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::with_loopback_marker(DEFAULT_LOOPBACK_MARKER)
    }

    /// Use `marker` for mirror entries; match it with the config's marker.
    pub fn with_loopback_marker(marker: impl Into<String>) -> Self {
        Self {
            loopback_marker: marker.into(),
        }
    }

    fn describe(index: usize, device: &cpal::Device) -> Result<DeviceInfo> {
        let name = device.name()?;
        let input = device.default_input_config().ok();
        let output = device.default_output_config().ok();

        let default_sample_rate = input
            .as_ref()
            .or(output.as_ref())
            .map_or(0, |config| config.sample_rate().0);

        Ok(DeviceInfo {
            index,
            name,
            input_channels: input.as_ref().map_or(0, |c| c.channels()),
            output_channels: output.as_ref().map_or(0, |c| c.channels()),
            default_sample_rate,
        })
    }

    /// Look a device up again in the live enumeration, preferring the entry
    /// at `index` when names repeat.
    fn find_device(name: &str, index: Option<usize>) -> Result<Option<cpal::Device>> {
        let host = cpal::default_host();
        let mut first = None;
        for (idx, device) in host.devices()?.enumerate() {
            let Ok(device_name) = device.name() else { continue };
            if device_name == name {
                if Some(idx) == index {
                    return Ok(Some(device));
                }
                first.get_or_insert(device);
            }
        }
        Ok(first)
    }

    /// Device and sample format to capture `info` from. A mirror entry
    /// resolves to its output device in loopback mode.
    fn capture_device(&self, info: &DeviceInfo) -> Result<(cpal::Device, cpal::SampleFormat)> {
        if let Some(device) = Self::find_device(&info.name, Some(info.index))? {
            let format = device.default_input_config()?.sample_format();
            return Ok((device, format));
        }

        let output = HOST_LOOPBACK
            .then(|| loopback_source(&info.name, &self.loopback_marker))
            .flatten();
        if let Some(output) = output {
            if let Some(device) = Self::find_device(output, None)? {
                tracing::debug!("capturing '{}' in loopback mode", output);
                let format = device.default_output_config()?.sample_format();
                return Ok((device, format));
            }
        }
        Err(Error::StreamOpenFailed(format!(
            "device '{}' disappeared",
            info.name
        )))
    }

    fn stream_config(params: &StreamParams) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: params.channels,
            sample_rate: cpal::SampleRate(params.sample_rate),
            buffer_size: params
                .frames_per_buffer
                .map_or(cpal::BufferSize::Default, cpal::BufferSize::Fixed),
        }
    }

    fn build_input<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut callback: InputCallback,
        monitor: Arc<StreamMonitor>,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample,
        f32: cpal::FromSample<T>,
    {
        let channels = config.channels.max(1) as usize;
        let mut scratch = vec![0.0f32; SCRATCH_FRAMES * channels];
        let error_monitor = Arc::clone(&monitor);

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                for chunk in data.chunks(scratch.len()) {
                    let frames = chunk.len() / channels;
                    let block = &mut scratch[..frames * channels];
                    for (dst, &src) in block.iter_mut().zip(chunk) {
                        *dst = src.to_sample::<f32>();
                    }
                    monitor.drive_input(&mut callback, Some(&*block), frames);
                }
            },
            move |err| error_monitor.fail(err.to_string()),
            None,
        )?;

        Ok(stream)
    }

    fn build_output<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut callback: OutputCallback,
        monitor: Arc<StreamMonitor>,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels.max(1) as usize;
        let mut scratch = vec![0.0f32; SCRATCH_FRAMES * channels];
        let error_monitor = Arc::clone(&monitor);

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let chunk_len = scratch.len();
                for chunk in data.chunks_mut(chunk_len) {
                    let frames = chunk.len() / channels;
                    let block = &mut scratch[..frames * channels];
                    monitor.drive_output(&mut callback, block, frames);
                    for (dst, &value) in chunk.iter_mut().zip(block.iter()) {
                        *dst = T::from_sample(value);
                    }
                }
            },
            move |err| error_monitor.fail(err.to_string()),
            None,
        )?;

        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let host = cpal::default_host();
        let devices = host
            .devices()?
            .enumerate()
            .map(|(idx, device)| Self::describe(idx, &device))
            .collect::<Result<Vec<_>>>()?;

        if HOST_LOOPBACK {
            Ok(with_loopback_mirrors(devices, &self.loopback_marker))
        } else {
            Ok(devices)
        }
    }

    fn default_output_device(&self) -> Result<Option<DeviceInfo>> {
        let host = cpal::default_host();
        let Some(device) = host.default_output_device() else {
            return Ok(None);
        };
        let name = device.name()?;

        let listed = self
            .devices()?
            .into_iter()
            .find(|d| d.name == name && d.is_output());
        match listed {
            Some(info) => Ok(Some(info)),
            None => Self::describe(usize::MAX, &device).map(Some),
        }
    }

    fn open_input(
        &self,
        device: &DeviceInfo,
        params: &StreamParams,
        callback: InputCallback,
    ) -> Result<Box<dyn AudioStream>> {
        let (device, format) = self.capture_device(device)?;
        let config = Self::stream_config(params);
        let monitor = Arc::new(StreamMonitor::new());

        let stream = match format {
            cpal::SampleFormat::F32 => {
                Self::build_input::<f32>(&device, &config, callback, Arc::clone(&monitor))?
            }
            cpal::SampleFormat::I16 => {
                Self::build_input::<i16>(&device, &config, callback, Arc::clone(&monitor))?
            }
            cpal::SampleFormat::U16 => {
                Self::build_input::<u16>(&device, &config, callback, Arc::clone(&monitor))?
            }
            format => {
                return Err(Error::StreamOpenFailed(format!(
                    "Unsupported sample format: {:?}",
                    format
                )));
            }
        };

        Ok(Box::new(CpalStream {
            stream: StreamHandle(stream),
            monitor,
        }))
    }

    fn open_output(
        &self,
        device: Option<&DeviceInfo>,
        params: &StreamParams,
        callback: OutputCallback,
    ) -> Result<Box<dyn AudioStream>> {
        let device = match device {
            Some(info) => Self::find_device(&info.name, Some(info.index))?.ok_or_else(|| {
                Error::StreamOpenFailed(format!("device '{}' disappeared", info.name))
            })?,
            None => cpal::default_host()
                .default_output_device()
                .ok_or_else(|| Error::StreamOpenFailed("No output device available".into()))?,
        };
        let format = device.default_output_config()?.sample_format();
        let config = Self::stream_config(params);
        let monitor = Arc::new(StreamMonitor::new());

        let stream = match format {
            cpal::SampleFormat::F32 => {
                Self::build_output::<f32>(&device, &config, callback, Arc::clone(&monitor))?
            }
            cpal::SampleFormat::I16 => {
                Self::build_output::<i16>(&device, &config, callback, Arc::clone(&monitor))?
            }
            cpal::SampleFormat::U16 => {
                Self::build_output::<u16>(&device, &config, callback, Arc::clone(&monitor))?
            }
            format => {
                return Err(Error::StreamOpenFailed(format!(
                    "Unsupported sample format: {:?}",
                    format
                )));
            }
        };

        Ok(Box::new(CpalStream {
            stream: StreamHandle(stream),
            monitor,
        }))
    }
}

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` due to platform internals. The owning engine is
/// driven from a single cooperative thread and never shares the handle.
struct StreamHandle(cpal::Stream);

// SAFETY: the handle is owned by exactly one engine and only touched through
// `&mut self` or by value from the thread that drives that engine.
unsafe impl Send for StreamHandle {}

struct CpalStream {
    stream: StreamHandle,
    monitor: Arc<StreamMonitor>,
}

impl AudioStream for CpalStream {
    fn start(&mut self) -> Result<()> {
        self.stream.0.play()?;
        Ok(())
    }

    fn status(&self) -> StreamStatus {
        self.monitor.status()
    }

    fn close(self: Box<Self>) -> Result<()> {
        if let Err(err) = self.stream.0.pause() {
            tracing::debug!("pause before close failed: {}", err);
        }
        Ok(())
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}
