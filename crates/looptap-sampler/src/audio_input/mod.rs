//! Loopback capture.
//!
//! - [`CaptureEngine`]: opens the loopback input and fills a fresh buffer

mod capture;

pub use capture::{CaptureEngine, CaptureStarted};
