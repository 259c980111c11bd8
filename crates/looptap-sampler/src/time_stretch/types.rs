//! Time-stretching types and options.

use thiserror::Error;

/// FFT size presets for the offline stretch.
///
/// Larger sizes resolve low frequencies better but smear transients:
///
/// - **Small (1024)**: speech and percussive material
/// - **Medium (2048)**: Default, balanced
/// - **Large (4096)**: sustained tonal material
/// - **XLarge (8192)**: extreme ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FftSize {
    Small = 1024,

    #[default]
    Medium = 2048,

    Large = 4096,

    XLarge = 8192,
}

impl FftSize {
    /// Get the FFT size as usize
    pub fn size(&self) -> usize {
        *self as usize
    }

    /// Synthesis hop (FFT size / 4 = 75% overlap)
    pub fn hop_size(&self) -> usize {
        self.size() / 4
    }

    /// Nearest preset at or above `size`, capped at `XLarge`.
    pub fn from_size(size: usize) -> Self {
        match size {
            0..=1024 => FftSize::Small,
            1025..=2048 => FftSize::Medium,
            2049..=4096 => FftSize::Large,
            _ => FftSize::XLarge,
        }
    }
}

/// How input is delivered to the stretcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessMode {
    /// Whole signal studied first, then processed in one go.
    #[default]
    Offline,
    /// Incremental processing. Not supported by [`OfflineStretcher`](super::OfflineStretcher).
    RealTime,
}

/// Stretcher construction options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchOptions {
    pub mode: ProcessMode,
    pub fft_size: FftSize,
    /// Rescale each output channel to the RMS level measured during study.
    pub normalize: bool,
}

impl StretchOptions {
    pub fn new() -> Self {
        Self {
            mode: ProcessMode::Offline,
            fft_size: FftSize::Medium,
            normalize: true,
        }
    }

    pub fn fft_size(mut self, fft_size: FftSize) -> Self {
        self.fft_size = fft_size;
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn mode(mut self, mode: ProcessMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for StretchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from the stretch transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StretchError {
    #[error("Only offline processing is supported")]
    UnsupportedMode,

    #[error("Invalid time ratio: {0}")]
    InvalidRatio(f64),

    #[error("Expected {expected} channels, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Channels have different lengths")]
    RaggedInput,

    #[error("Process called before the final study pass")]
    NotStudied,

    #[error("Processed {processed} frames but studied {studied}")]
    LengthMismatch { studied: usize, processed: usize },

    #[error("Input already finalised")]
    AlreadyFinal,

    #[error("Failed to allocate {frames} frames of stretch output")]
    AllocationFailed { frames: usize },
}
