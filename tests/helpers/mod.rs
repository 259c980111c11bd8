//! Test helpers and fixtures for looptap integration tests
//!
//! Every engine here runs on the manual backend: the test drives buffer
//! periods itself, so no audio hardware is needed.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact copies (capture, playback)
//! - `STRETCH_EPSILON` (1e-3): Unit-ratio stretch reconstruction
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use looptap::prelude::*;
use looptap::ManualBackend;

/// Low rate keeps stretch tests fast.
pub const TEST_SAMPLE_RATE: u32 = 8000;

pub const TEST_CHANNELS: u16 = 2;

/// Frames per pumped buffer period.
pub const TEST_BUFFER_SIZE: usize = 64;

pub const TEST_OUTPUT_NAME: &str = "Test Speakers";

/// Install a test-writer subscriber once per binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Output device plus its loopback mirror, at the test rate.
pub fn test_backend() -> ManualBackend {
    ManualBackend::loopback_pair(TEST_OUTPUT_NAME, TEST_CHANNELS, TEST_SAMPLE_RATE)
}

/// Engine over `backend` with room for `max_record_secs`.
pub fn test_engine(backend: &ManualBackend, max_record_secs: f64) -> LooptapEngine {
    init_tracing();
    LooptapEngine::builder()
        .config(LooptapConfig {
            stretch_fft_size: 1024,
            ..Default::default()
        })
        .sample_rate(TEST_SAMPLE_RATE)
        .max_record_secs(max_record_secs)
        .backend(backend.clone())
        .build()
        .expect("Failed to create test engine")
}

/// Interleaved sine, same signal on every channel.
pub fn generate_sine(frequency: f64, frames: usize, channels: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames * channels);
    for i in 0..frames {
        let t = i as f64 / TEST_SAMPLE_RATE as f64;
        let s = ((2.0 * std::f64::consts::PI * frequency * t).sin() * 0.5) as f32;
        out.extend(std::iter::repeat(s).take(channels));
    }
    out
}

/// Feed `input` to the open capture stream in `period`-frame chunks.
/// Returns the number of periods the backend accepted.
pub fn pump_capture(backend: &ManualBackend, input: &[f32], channels: usize, period: usize) -> usize {
    let mut pumped = 0;
    for chunk in input.chunks(period * channels) {
        if !backend.pump_input(Some(chunk), chunk.len() / channels) {
            break;
        }
        pumped += 1;
    }
    pumped
}

/// Pull `periods` output periods and concatenate them.
pub fn pump_playback(backend: &ManualBackend, periods: usize, period: usize) -> Vec<f32> {
    let mut out = Vec::new();
    for _ in 0..periods {
        match backend.pump_output(period) {
            Some(chunk) => out.extend(chunk),
            None => break,
        }
    }
    out
}

/// Poll until the engine leaves its current stream or `max_ticks` pass.
pub fn poll_until_idle(engine: &mut LooptapEngine, start: Instant, max_ticks: u32) -> PollOutcome {
    let mut now = start;
    for _ in 0..max_ticks {
        now += engine.poll_interval();
        match engine.poll(now) {
            PollOutcome::Active | PollOutcome::NotDue => continue,
            outcome => return outcome,
        }
    }
    PollOutcome::Active
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}

pub fn is_silent(samples: &[f32]) -> bool {
    peak(samples) < tolerances::SILENCE_THRESHOLD
}

/// One channel out of an interleaved signal.
pub fn channel(samples: &[f32], channels: usize, index: usize) -> Vec<f32> {
    samples.iter().skip(index).step_by(channels).copied().collect()
}
