//! Centralized error type for the looptap umbrella crate.
//!
//! Wraps subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] looptap_core::Error),

    #[error("Time stretch: {0}")]
    TimeStretch(#[from] looptap_sampler::StretchError),
}

impl Error {
    /// False only for configuration errors; everything else leaves the
    /// engine usable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Core(err) => err.is_recoverable(),
            Error::TimeStretch(_) => true,
        }
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            Error::Core(looptap_core::Error::InvalidTransition { .. })
        )
    }
}

impl From<looptap_sampler::Error> for Error {
    fn from(err: looptap_sampler::Error) -> Self {
        match err {
            looptap_sampler::Error::Core(err) => Error::Core(err),
            looptap_sampler::Error::TimeStretch(err) => Error::TimeStretch(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
