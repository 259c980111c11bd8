//! Error types.

use crate::time_stretch::StretchError;
use thiserror::Error;

/// Error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Device, stream, buffer or transport error.
    #[error(transparent)]
    Core(#[from] looptap_core::Error),

    /// Time stretch error.
    #[error("Time stretch error: {0}")]
    TimeStretch(#[from] StretchError),
}

impl Error {
    /// The core error, if this wraps one.
    pub fn as_core(&self) -> Option<&looptap_core::Error> {
        match self {
            Error::Core(err) => Some(err),
            Error::TimeStretch(_) => None,
        }
    }
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
