//! Offline multi-channel stretcher with a study/process/retrieve interface.
//!
//! Usage: [`set_time_ratio`](OfflineStretcher::set_time_ratio), then
//! [`study`](OfflineStretcher::study) the whole signal, then
//! [`process`](OfflineStretcher::process) the same signal, both with
//! `is_final = true` on the last block, then drain with
//! [`available`](OfflineStretcher::available) / [`retrieve`](OfflineStretcher::retrieve).

use super::phase_vocoder::PhaseVocoder;
use super::types::{ProcessMode, StretchError, StretchOptions};

/// Minimum RMS threshold to avoid division by zero during normalization.
const NORMALIZE_RMS_FLOOR: f32 = 1e-8;

/// Computes the RMS (root mean square) of a signal.
#[inline]
pub(crate) fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Scales output so its RMS matches `target_rms`, if the output has sufficient energy.
#[inline]
fn normalize_rms(output: &mut [f32], target_rms: f32) {
    let output_rms = compute_rms(output);
    if output_rms < NORMALIZE_RMS_FLOOR || target_rms < NORMALIZE_RMS_FLOOR {
        return;
    }
    let gain = target_rms / output_rms;
    for s in output.iter_mut() {
        *s *= gain;
    }
}

pub struct OfflineStretcher {
    sample_rate: u32,
    channels: usize,
    options: StretchOptions,
    time_ratio: f64,
    vocoder: PhaseVocoder,

    studied_frames: usize,
    study_sum_sq: Vec<f64>,
    study_done: bool,

    pending: Vec<Vec<f32>>,
    output: Vec<Vec<f32>>,
    output_read: usize,
    process_done: bool,
}

impl OfflineStretcher {
    pub fn new(
        sample_rate: u32,
        channels: usize,
        options: StretchOptions,
    ) -> Result<Self, StretchError> {
        if options.mode != ProcessMode::Offline {
            return Err(StretchError::UnsupportedMode);
        }
        let channels = channels.max(1);

        Ok(Self {
            sample_rate,
            channels,
            options,
            time_ratio: 1.0,
            vocoder: PhaseVocoder::new(options.fft_size),
            studied_frames: 0,
            study_sum_sq: vec![0.0; channels],
            study_done: false,
            pending: vec![Vec::new(); channels],
            output: Vec::new(),
            output_read: 0,
            process_done: false,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn time_ratio(&self) -> f64 {
        self.time_ratio
    }

    /// Output duration over input duration (2.0 = twice as long).
    pub fn set_time_ratio(&mut self, ratio: f64) -> Result<(), StretchError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(StretchError::InvalidRatio(ratio));
        }
        if self.process_done {
            return Err(StretchError::AlreadyFinal);
        }
        self.time_ratio = ratio;
        Ok(())
    }

    fn block_frames(&self, input: &[&[f32]]) -> Result<usize, StretchError> {
        if input.len() != self.channels {
            return Err(StretchError::ChannelMismatch {
                expected: self.channels,
                actual: input.len(),
            });
        }
        let frames = input.first().map_or(0, |c| c.len());
        if input.iter().any(|c| c.len() != frames) {
            return Err(StretchError::RaggedInput);
        }
        Ok(frames)
    }

    /// Analysis pass: measures length and level of the whole signal.
    pub fn study(&mut self, input: &[&[f32]], is_final: bool) -> Result<(), StretchError> {
        if self.study_done {
            return Err(StretchError::AlreadyFinal);
        }
        let frames = self.block_frames(input)?;

        for (sum, channel) in self.study_sum_sq.iter_mut().zip(input) {
            *sum += channel.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>();
        }
        self.studied_frames += frames;
        self.study_done = is_final;
        Ok(())
    }

    /// Synthesis pass over the studied signal. Output is produced once the
    /// final block arrives.
    pub fn process(&mut self, input: &[&[f32]], is_final: bool) -> Result<(), StretchError> {
        if !self.study_done {
            return Err(StretchError::NotStudied);
        }
        if self.process_done {
            return Err(StretchError::AlreadyFinal);
        }
        self.block_frames(input)?;

        for (pending, channel) in self.pending.iter_mut().zip(input) {
            pending.extend_from_slice(channel);
        }

        let processed = self.pending[0].len();
        if processed > self.studied_frames {
            return Err(StretchError::LengthMismatch {
                studied: self.studied_frames,
                processed,
            });
        }
        if !is_final {
            return Ok(());
        }
        if processed != self.studied_frames {
            return Err(StretchError::LengthMismatch {
                studied: self.studied_frames,
                processed,
            });
        }

        let mut output = Vec::with_capacity(self.channels);
        for (ch, channel) in self.pending.iter().enumerate() {
            let mut stretched = self.vocoder.process(channel, self.time_ratio)?;
            if self.options.normalize && self.studied_frames > 0 {
                let target = (self.study_sum_sq[ch] / self.studied_frames as f64).sqrt() as f32;
                normalize_rms(&mut stretched, target);
            }
            output.push(stretched);
        }

        self.pending = vec![Vec::new(); self.channels];
        self.output = output;
        self.output_read = 0;
        self.process_done = true;
        Ok(())
    }

    /// Frames ready to retrieve.
    pub fn available(&self) -> usize {
        self.output
            .first()
            .map_or(0, |c| c.len().saturating_sub(self.output_read))
    }

    /// Copy up to the shortest output slice's length; returns frames written.
    pub fn retrieve(&mut self, outputs: &mut [&mut [f32]]) -> usize {
        let capacity = outputs.iter().map(|o| o.len()).min().unwrap_or(0);
        let frames = self.available().min(capacity);
        if frames == 0 {
            return 0;
        }

        let start = self.output_read;
        for (dst, src) in outputs.iter_mut().zip(&self.output) {
            dst[..frames].copy_from_slice(&src[start..start + frames]);
        }
        self.output_read += frames;
        frames
    }
}
