//! Capture, time-stretch and playback engines for the loopback recorder.
//!
//! # Features
//!
//! - **Audio input**: loopback capture into a fixed-capacity buffer
//! - **Time-stretching**: offline phase vocoder, duration changes and pitch holds
//! - **Playback**: stretched buffer out to the default output device
//!
//! # Example
//!
//! ```ignore
//! use looptap_sampler::{CaptureEngine, PlaybackEngine};
//!
//! let mut capture = CaptureEngine::new(backend.clone(), transport.clone(), slot.clone(), &config);
//! capture.start(Instant::now())?;
//! // ... event loop calls capture.poll(now) until it reports Finished
//! let mut playback = PlaybackEngine::new(backend, transport, slot, &config);
//! playback.play(Instant::now())?;
//! ```

// Error types
pub mod error;
pub use error::{Error, Result};

mod active;
pub use active::PollOutcome;

pub mod audio_input;
pub use audio_input::{CaptureEngine, CaptureStarted};

pub mod playback;
pub use playback::{PlayOutcome, PlaybackEngine};

pub mod time_stretch;
pub use time_stretch::{
    FftSize, OfflineStretcher, PhaseVocoder, ProcessMode, StretchError, StretchOptions,
    StretchReport, TimeStretchPipeline,
};
