//! Stretch the recorded buffer ahead of playback.

use std::time::{Duration, Instant};

use looptap_core::{AudioBuffer, BufferSlot, LooptapConfig};

use super::stretcher::OfflineStretcher;
use super::types::{FftSize, StretchError, StretchOptions};
use crate::{Error, Result};

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchReport {
    /// User speed ratio after clamping.
    pub speed_ratio: f64,
    /// Duration ratio fed to the stretcher (`1 / speed_ratio`).
    pub time_ratio: f64,
    pub input_frames: usize,
    pub output_frames: usize,
    pub elapsed: Duration,
}

/// De-interleave, stretch, re-interleave, replace.
#[derive(Debug, Clone, Copy)]
pub struct TimeStretchPipeline {
    options: StretchOptions,
    min_speed_ratio: f64,
    max_speed_ratio: f64,
}

impl TimeStretchPipeline {
    pub fn new(options: StretchOptions, min_speed_ratio: f64, max_speed_ratio: f64) -> Self {
        Self {
            options,
            min_speed_ratio,
            max_speed_ratio,
        }
    }

    pub fn from_config(config: &LooptapConfig) -> Self {
        let options = StretchOptions::new()
            .fft_size(FftSize::from_size(config.stretch_fft_size))
            .normalize(config.stretch_normalize);
        Self::new(options, config.min_speed_ratio, config.max_speed_ratio)
    }

    pub fn clamp_speed_ratio(&self, speed_ratio: f64) -> f64 {
        speed_ratio.clamp(self.min_speed_ratio, self.max_speed_ratio)
    }

    /// Stretch the recorded span of `buffer` for playback at `speed_ratio`.
    ///
    /// The result is a new, fully recorded buffer; `buffer` is untouched.
    /// A ratio of 1.0 still goes through the stretcher.
    pub fn stretch(&self, buffer: &AudioBuffer, speed_ratio: f64) -> Result<AudioBuffer> {
        let speed_ratio = self.clamp_speed_ratio(speed_ratio);
        let channels = buffer.channels();
        let planar = buffer.to_planar()?;
        let inputs: Vec<&[f32]> = planar.iter().map(Vec::as_slice).collect();

        let mut stretcher = OfflineStretcher::new(buffer.sample_rate(), channels, self.options)?;
        stretcher.set_time_ratio(1.0 / speed_ratio)?;
        stretcher.study(&inputs, true)?;
        stretcher
            .process(&inputs, true)
            .map_err(|err| match err {
                StretchError::AllocationFailed { frames } => {
                    Error::from(looptap_core::Error::AllocationFailed { frames })
                }
                err => Error::from(err),
            })?;

        let frames = stretcher.available();
        let mut output = Vec::with_capacity(channels);
        for _ in 0..channels {
            let mut channel = Vec::new();
            channel
                .try_reserve_exact(frames)
                .map_err(|_| looptap_core::Error::AllocationFailed { frames })?;
            channel.resize(frames, 0.0);
            output.push(channel);
        }

        let mut written = 0;
        while stretcher.available() > 0 {
            let mut outputs: Vec<&mut [f32]> =
                output.iter_mut().map(|c| &mut c[written..]).collect();
            let got = stretcher.retrieve(&mut outputs);
            if got == 0 {
                break;
            }
            written += got;
        }
        for channel in &mut output {
            channel.truncate(written);
        }

        Ok(AudioBuffer::from_planar(&output, buffer.sample_rate())?)
    }

    /// Stretch the slot's current buffer and swap the result in.
    ///
    /// On failure the slot keeps its previous buffer.
    pub fn run(&self, slot: &BufferSlot, speed_ratio: f64) -> Result<StretchReport> {
        let started = Instant::now();
        let current = slot.load();
        let input_frames = current.recorded_frames();
        let stretched = self.stretch(&current, speed_ratio)?;
        let output_frames = stretched.recorded_frames();

        slot.replace(stretched);

        let speed_ratio = self.clamp_speed_ratio(speed_ratio);
        let report = StretchReport {
            speed_ratio,
            time_ratio: 1.0 / speed_ratio,
            input_frames,
            output_frames,
            elapsed: started.elapsed(),
        };
        tracing::debug!(
            "stretched {} -> {} frames at {}x in {:?}",
            report.input_frames,
            report.output_frames,
            report.speed_ratio,
            report.elapsed
        );
        Ok(report)
    }
}

impl Default for TimeStretchPipeline {
    fn default() -> Self {
        Self::new(StretchOptions::default(), 0.5, 2.0)
    }
}
