//! Tolerance constants for audio testing.
//!
//! Different operations require different precision levels.

/// Floating point rounding errors (for copies that should be exact).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Phase vocoder reconstruction at unit ratio.
pub const STRETCH_EPSILON: f32 = 1e-3;

/// Relative RMS difference allowed after a normalized stretch.
pub const LEVEL_TOLERANCE: f32 = 0.05;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Frames a stretch may differ from `frames / speed_ratio` by.
pub const LENGTH_TOLERANCE_FRAMES: i64 = 1;
