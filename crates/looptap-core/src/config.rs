//! Recorder configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token carried by loopback input device names.
pub const DEFAULT_LOOPBACK_MARKER: &str = "[Loopback]";

/// Configuration for the loopback recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooptapConfig {
    /// Playback rate and the rate the record buffer is sized for.
    pub sample_rate: u32,
    /// Interleaved channels per frame, for both capture and playback.
    pub channels: u16,
    /// Maximum recording length. Capture completes once it is reached.
    pub max_record_secs: f64,
    /// Hardware buffer period. `None` lets the host choose.
    pub frames_per_buffer: Option<u32>,
    /// Period of the completion poller.
    pub poll_interval_ms: u64,
    /// Substring identifying loopback input devices.
    pub loopback_marker: String,
    pub min_speed_ratio: f64,
    pub max_speed_ratio: f64,
    /// FFT size of the offline stretch (power of two, 1024-8192).
    pub stretch_fft_size: usize,
    /// Rescale stretched output to the RMS level of the recording.
    pub stretch_normalize: bool,
}

impl Default for LooptapConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            max_record_secs: 10.0,
            frames_per_buffer: None,
            poll_interval_ms: 20,
            loopback_marker: DEFAULT_LOOPBACK_MARKER.to_string(),
            min_speed_ratio: 0.5,
            max_speed_ratio: 2.0,
            stretch_fft_size: 2048,
            stretch_normalize: true,
        }
    }
}

impl LooptapConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000..=384000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.channels == 0 || self.channels > 32 {
            return Err(Error::InvalidConfig(format!(
                "channels {} out of range (1-32)",
                self.channels
            )));
        }
        if !self.max_record_secs.is_finite() || self.max_record_secs <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_record_secs {} must be positive",
                self.max_record_secs
            )));
        }
        if self.capacity_frames() == 0 {
            return Err(Error::InvalidConfig(
                "max_record_secs is shorter than one frame".to_string(),
            ));
        }
        if self.frames_per_buffer == Some(0) {
            return Err(Error::InvalidConfig(
                "frames_per_buffer must be non-zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.loopback_marker.is_empty() {
            return Err(Error::InvalidConfig(
                "loopback_marker must not be empty".to_string(),
            ));
        }
        if !(self.min_speed_ratio > 0.0
            && self.min_speed_ratio.is_finite()
            && self.max_speed_ratio.is_finite()
            && self.min_speed_ratio <= self.max_speed_ratio)
        {
            return Err(Error::InvalidConfig(format!(
                "speed ratio bounds {}-{} invalid",
                self.min_speed_ratio, self.max_speed_ratio
            )));
        }
        if !self.stretch_fft_size.is_power_of_two()
            || !(1024..=8192).contains(&self.stretch_fft_size)
        {
            return Err(Error::InvalidConfig(format!(
                "stretch_fft_size {} must be a power of two (1024-8192)",
                self.stretch_fft_size
            )));
        }
        Ok(())
    }

    /// Frames in a full-length recording.
    pub fn capacity_frames(&self) -> usize {
        (self.max_record_secs * self.sample_rate as f64).floor() as usize
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn clamp_speed_ratio(&self, ratio: f64) -> f64 {
        ratio.clamp(self.min_speed_ratio, self.max_speed_ratio)
    }
}
