//! Shared transport state: the current phase and the user speed ratio.

use super::fsm::{Phase, TransportRequest};
use crate::lockfree::{AtomicDouble, AtomicTag};
use crate::{Error, Result};

/// Single arbiter of [`Phase`], shared by both engines and the dispatcher.
#[derive(Debug)]
pub struct TransportState {
    phase: AtomicTag<Phase>,
    speed_ratio: AtomicDouble,
    min_speed_ratio: f64,
    max_speed_ratio: f64,
}

impl TransportState {
    pub fn new(min_speed_ratio: f64, max_speed_ratio: f64) -> Self {
        Self {
            phase: AtomicTag::new(Phase::Idle),
            speed_ratio: AtomicDouble::new(1.0),
            min_speed_ratio,
            max_speed_ratio,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Apply `request` against the transition table.
    ///
    /// A rejected request leaves the phase untouched.
    pub fn request(&self, request: TransportRequest) -> Result<Phase> {
        let mut current = self.phase.get();
        loop {
            let next = current.transition(request)?;
            match self.phase.compare_exchange(current, next) {
                Ok(_) => return Ok(next),
                Err(observed) => current = observed,
            }
        }
    }

    /// Check `request` would be accepted without applying it.
    pub fn check(&self, request: TransportRequest) -> Result<Phase> {
        self.phase().transition(request)
    }

    /// User-facing playback speed multiplier (2.0 = double speed).
    pub fn speed_ratio(&self) -> f64 {
        self.speed_ratio.get()
    }

    pub fn set_speed_ratio(&self, ratio: f64) -> Result<()> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::InvalidSpeedRatio(ratio));
        }
        self.speed_ratio.set(ratio);
        Ok(())
    }

    /// Speed ratio clamped to the supported stretch range.
    pub fn effective_speed_ratio(&self) -> f64 {
        self.speed_ratio()
            .clamp(self.min_speed_ratio, self.max_speed_ratio)
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(0.5, 2.0)
    }
}
