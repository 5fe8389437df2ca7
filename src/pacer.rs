//! Output cadence and cancellation.
//!
//! The analyzer can chew through a file far faster than a visualizer wants
//! to draw it, so after every frame that produced points the driver waits a
//! fixed delay. The wait is a spin-assisted sleep to keep the cadence steady
//! at tens of milliseconds. Cancellation is cooperative: the driver checks a
//! shared [CancelToken] once per frame.

use spin_sleep::SpinSleeper;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

/// Default pause after each emitted frame.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(50);

/// A cloneable stop flag shared between whoever wants a run to end and the
/// pipeline that honours it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every holder of this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [CancelToken::cancel] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Fixed-delay pacing between emitted frames.
#[derive(Clone, Copy)]
pub struct Pacer {
    delay: Duration,
    sleeper: SpinSleeper,
}

impl Pacer {
    /// A pacer that waits `delay` per frame. A zero delay never sleeps.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            sleeper: SpinSleeper::default(),
        }
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Blocks the calling thread for the configured delay.
    pub fn pause(&self) {
        if !self.delay.is_zero() {
            self.sleeper.sleep(self.delay);
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn pause_waits_at_least_the_delay() {
        let pacer = Pacer::new(Duration::from_millis(20));
        let start = Instant::now();
        pacer.pause();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn zero_delay_returns_immediately() {
        let pacer = Pacer::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..1000 {
            pacer.pause();
        }
        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(Pacer::default().delay(), DEFAULT_FRAME_DELAY);
    }
}
