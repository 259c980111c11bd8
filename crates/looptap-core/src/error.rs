//! Error types for looptap-core.

use crate::transport::{Phase, TransportRequest};
use thiserror::Error;

/// Error type for looptap-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("No loopback input device mirrors the default output device")]
    DeviceUnavailable,

    #[error("Failed to open audio stream: {0}")]
    StreamOpenFailed(String),

    #[error("Failed to start audio stream: {0}")]
    StreamStartFailed(String),

    #[error("Failed to allocate audio buffer of {frames} frames")]
    AllocationFailed { frames: usize },

    #[error("Audio stream reported an error: {0}")]
    StreamRuntimeError(String),

    #[error("Cannot {request} while {phase}")]
    InvalidTransition {
        request: TransportRequest,
        phase: Phase,
    },

    #[error("Invalid speed ratio: {0}. Must be positive and finite")]
    InvalidSpeedRatio(f64),

    #[error("Audio backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Every error leaves the transport in a usable phase; the caller may retry.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::InvalidConfig(_))
    }
}

#[cfg(feature = "hardware")]
impl From<cpal::DevicesError> for Error {
    fn from(err: cpal::DevicesError) -> Self {
        Error::Backend(err.to_string())
    }
}

#[cfg(feature = "hardware")]
impl From<cpal::DeviceNameError> for Error {
    fn from(err: cpal::DeviceNameError) -> Self {
        Error::Backend(err.to_string())
    }
}

#[cfg(feature = "hardware")]
impl From<cpal::BuildStreamError> for Error {
    fn from(err: cpal::BuildStreamError) -> Self {
        Error::StreamOpenFailed(err.to_string())
    }
}

#[cfg(feature = "hardware")]
impl From<cpal::PlayStreamError> for Error {
    fn from(err: cpal::PlayStreamError) -> Self {
        Error::StreamStartFailed(err.to_string())
    }
}

#[cfg(feature = "hardware")]
impl From<cpal::DefaultStreamConfigError> for Error {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        Error::StreamOpenFailed(err.to_string())
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
