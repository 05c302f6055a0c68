#![forbid(unsafe_code)]

//! Monotonic time sources.
//!
//! All timestamps in ScrollDeck are [`Duration`]s since an arbitrary origin.
//! The host owns wall time and passes it in; host-driven (WASM) steppers and
//! tests advance a [`ManualClock`] explicitly.

use std::time::Duration;

/// A source of monotonic time.
pub trait Clock {
    /// Current monotonic time since the clock's origin.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the caller.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time. Moving backwards is ignored.
    pub fn set(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for ManualClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}
