//! Builder for configuring and constructing a `LooptapEngine`.

use std::sync::Arc;
use std::time::Duration;

use looptap_core::{AudioBackend, LooptapConfig};

use crate::{LooptapEngine, Result};

/// Without `.backend()` the engine talks to real devices through cpal when
/// the `hardware` feature is on, and to an empty manual backend otherwise.
///
/// # Example
///
/// ```ignore
/// use looptap::prelude::*;
///
/// let engine = LooptapEngine::builder()
///     .max_record_secs(5.0)
///     .sample_rate(48000)
///     .build()?;
/// ```
#[derive(Default)]
pub struct LooptapEngineBuilder {
    config: LooptapConfig,
    backend: Option<Arc<dyn AudioBackend>>,
}

impl LooptapEngineBuilder {
    /// Replace the whole configuration. Later setters override its fields.
    pub fn config(mut self, config: LooptapConfig) -> Self {
        self.config = config;
        self
    }

    pub fn backend<B: AudioBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Default: 10 seconds
    pub fn max_record_secs(mut self, secs: f64) -> Self {
        self.config.max_record_secs = secs;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 2
    pub fn channels(mut self, channels: u16) -> Self {
        self.config.channels = channels;
        self
    }

    /// Default: 20 ms
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn build(self) -> Result<LooptapEngine> {
        self.config.validate()?;
        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(&self.config),
        };
        LooptapEngine::new(self.config, backend)
    }
}

#[cfg(feature = "hardware")]
fn default_backend(config: &LooptapConfig) -> Arc<dyn AudioBackend> {
    Arc::new(looptap_core::CpalBackend::with_loopback_marker(
        config.loopback_marker.as_str(),
    ))
}

#[cfg(not(feature = "hardware"))]
fn default_backend(_config: &LooptapConfig) -> Arc<dyn AudioBackend> {
    Arc::new(looptap_core::ManualBackend::default())
}
