//! Offline phase vocoder for time-stretching.
//!
//! ## Algorithm Overview
//!
//! 1. **Analysis**: Hann-windowed frames read from the input at a fractional
//!    hop of `synthesis_hop / time_ratio`
//! 2. **Phase Propagation**: instantaneous frequency per bin from the phase
//!    advance between analysis frames, accumulated over the synthesis hop
//! 3. **Phase Locking**: bins around each spectral peak keep their analysed
//!    phase offset to the peak (identity phase locking)
//! 4. **Synthesis**: inverse FFT, windowed overlap-add at a fixed hop of
//!    `fft_size / 4`, normalised by the summed window power
//!
//! Frames are centred on their hop positions, so output sample `t` lines up
//! with input sample `t / time_ratio`. Pitch is unchanged.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

use super::types::{FftSize, StretchError};

const TWO_PI: f32 = 2.0 * PI;

/// Summed window power below which overlap-add output is left unscaled.
const WINDOW_SUM_FLOOR: f32 = 1e-3;

/// Wrap a phase value to `[-PI, PI)`.
#[inline]
pub(crate) fn wrap_phase(phase: f32) -> f32 {
    (phase + PI).rem_euclid(TWO_PI) - PI
}

/// Zero-filled scratch of `len` samples, or `AllocationFailed`.
fn zeroed(len: usize) -> Result<Vec<f32>, StretchError> {
    let mut samples = Vec::new();
    samples
        .try_reserve_exact(len)
        .map_err(|_| StretchError::AllocationFailed { frames: len })?;
    samples.resize(len, 0.0);
    Ok(samples)
}

/// Phase vocoder state, reusable across channels.
pub struct PhaseVocoder {
    fft_size: usize,
    hop_synthesis: usize,
    window: Vec<f32>,
    planner: FftPlanner<f32>,
    fft_buffer: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    prev_phase: Vec<f32>,
    synth_phase: Vec<f32>,
    peaks: Vec<usize>,
}

impl PhaseVocoder {
    pub fn new(fft_size: FftSize) -> Self {
        let size = fft_size.size();
        let num_bins = size / 2 + 1;

        Self {
            fft_size: size,
            hop_synthesis: fft_size.hop_size(),
            window: Self::create_hann_window(size),
            planner: FftPlanner::new(),
            fft_buffer: vec![Complex::new(0.0, 0.0); size],
            magnitudes: vec![0.0; num_bins],
            prev_phase: vec![0.0; num_bins],
            synth_phase: vec![0.0; num_bins],
            peaks: Vec::with_capacity(num_bins / 4),
        }
    }

    /// Periodic Hann window
    fn create_hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| 0.5 * (1.0 - (TWO_PI * i as f32 / size as f32).cos()))
            .collect()
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_synthesis(&self) -> usize {
        self.hop_synthesis
    }

    /// Frames produced for `input_frames` at `time_ratio` (output / input duration).
    pub fn output_len(input_frames: usize, time_ratio: f64) -> usize {
        (input_frames as f64 * time_ratio).round() as usize
    }

    /// Stretch a mono signal by `time_ratio`.
    ///
    /// Output length is [`output_len`](Self::output_len). Ratios must be
    /// positive and finite. Fails without side effects if the overlap-add
    /// timeline cannot be allocated.
    pub fn process(&mut self, input: &[f32], time_ratio: f64) -> Result<Vec<f32>, StretchError> {
        let target = Self::output_len(input.len(), time_ratio);
        if input.is_empty() || target == 0 {
            return Ok(Vec::new());
        }

        let n = self.fft_size;
        let half = n / 2;
        let hs = self.hop_synthesis;
        let hop_analysis = hs as f64 / time_ratio;
        let num_bins = half + 1;

        // Extended timeline: frame j spans [j * hs, j * hs + n), real output
        // starts at `half`.
        let num_frames = (target + half).div_ceil(hs) + 1;
        let ext_len = (num_frames - 1) * hs + n;
        let mut output = zeroed(ext_len)?;
        let mut window_sum = zeroed(ext_len)?;

        let fft_forward = self.planner.plan_fft_forward(n);
        let fft_inverse = self.planner.plan_fft_inverse(n);
        let norm = 1.0 / n as f32;

        self.prev_phase.fill(0.0);
        self.synth_phase.fill(0.0);
        let mut prev_centre: i64 = 0;

        for frame in 0..num_frames {
            let centre = (frame as f64 * hop_analysis).round() as i64;
            let start = centre - half as i64;

            // Analysis: window and FFT, zero outside the input
            for (i, (slot, &win)) in self.fft_buffer.iter_mut().zip(&self.window).enumerate() {
                let idx = start + i as i64;
                let sample = if idx >= 0 && (idx as usize) < input.len() {
                    input[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * win, 0.0);
            }
            fft_forward.process(&mut self.fft_buffer);

            let actual_hop = (centre - prev_centre) as f32;
            let propagate = frame > 0 && actual_hop > 0.0;
            for bin in 0..num_bins {
                let c = self.fft_buffer[bin];
                let phase = c.arg();
                self.magnitudes[bin] = c.norm();

                if propagate {
                    let omega = TWO_PI * bin as f32 / n as f32;
                    let deviation =
                        wrap_phase(phase - self.prev_phase[bin] - omega * actual_hop);
                    let inst_freq = omega + deviation / actual_hop;
                    self.synth_phase[bin] =
                        wrap_phase(self.synth_phase[bin] + inst_freq * hs as f32);
                } else {
                    self.synth_phase[bin] = phase;
                }
                self.prev_phase[bin] = phase;
            }
            prev_centre = centre;

            if propagate {
                self.lock_to_peaks(num_bins);
            }

            self.reconstruct_spectrum(num_bins);
            fft_inverse.process(&mut self.fft_buffer);

            // Overlap-add with synthesis window
            let base = frame * hs;
            for (i, &win) in self.window.iter().enumerate() {
                output[base + i] += self.fft_buffer[i].re * norm * win;
                window_sum[base + i] += win * win;
            }
        }

        for (sample, &sum) in output.iter_mut().zip(&window_sum) {
            if sum > WINDOW_SUM_FLOOR {
                *sample /= sum;
            }
        }

        output.drain(..half);
        output.truncate(target);
        output.resize(target, 0.0);
        Ok(output)
    }

    /// Give every non-peak bin the synthesis phase of its nearest peak plus
    /// the analysed offset between the two. `prev_phase` holds the current
    /// analysis phases here.
    fn lock_to_peaks(&mut self, num_bins: usize) {
        self.peaks.clear();
        for bin in 1..num_bins - 1 {
            let mag = self.magnitudes[bin];
            if mag > self.magnitudes[bin - 1] && mag >= self.magnitudes[bin + 1] {
                self.peaks.push(bin);
            }
        }
        if self.peaks.is_empty() {
            return;
        }

        let mut nearest = 0;
        for bin in 0..num_bins {
            while nearest + 1 < self.peaks.len()
                && self.peaks[nearest + 1].abs_diff(bin) < self.peaks[nearest].abs_diff(bin)
            {
                nearest += 1;
            }
            let peak = self.peaks[nearest];
            if bin != peak {
                self.synth_phase[bin] = wrap_phase(
                    self.synth_phase[peak] + self.prev_phase[bin] - self.prev_phase[peak],
                );
            }
        }
    }

    /// Rebuild the complex spectrum from magnitudes and synthesis phases,
    /// mirroring negative frequencies for a real inverse transform.
    fn reconstruct_spectrum(&mut self, num_bins: usize) {
        let n = self.fft_size;
        for bin in 0..num_bins {
            self.fft_buffer[bin] = Complex::from_polar(self.magnitudes[bin], self.synth_phase[bin]);
        }
        // DC and Nyquist carry no phase in a real signal
        self.fft_buffer[0] = Complex::new(self.fft_buffer[0].re, 0.0);
        self.fft_buffer[n / 2] = Complex::new(self.fft_buffer[n / 2].re, 0.0);
        for bin in 1..n / 2 {
            self.fft_buffer[n - bin] = self.fft_buffer[bin].conj();
        }
    }
}
