//! Lock-free primitives shared with the audio thread.

use atomic_float::AtomicF64;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Cache-line aligned atomic f64.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicDouble {
    value: AtomicF64,
}

impl AtomicDouble {
    pub fn new(value: f64) -> Self {
        Self {
            value: AtomicF64::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicDouble {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    /// Set and return the previous value.
    #[inline]
    pub fn swap(&self, value: bool) -> bool {
        self.value.swap(value, Ordering::AcqRel)
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Atomic cell for a small `Copy` enum encoded as `u8`.
///
/// `compare_exchange` lets exactly one writer win a state change.
#[derive(Debug)]
pub struct AtomicTag<T> {
    value: AtomicU8,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Copy + Into<u8> + From<u8>> AtomicTag<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: AtomicU8::new(value.into()),
            _marker: std::marker::PhantomData,
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        T::from(self.value.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, value: T) {
        self.value.store(value.into(), Ordering::Release);
    }

    /// Replace `current` with `new`. Returns the observed value on mismatch.
    #[inline]
    pub fn compare_exchange(&self, current: T, new: T) -> Result<T, T> {
        self.value
            .compare_exchange(current.into(), new.into(), Ordering::AcqRel, Ordering::Acquire)
            .map(T::from)
            .map_err(T::from)
    }
}
