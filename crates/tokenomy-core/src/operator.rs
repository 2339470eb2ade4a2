//! Cooperative run control shared between a run loop and its caller.
//!
//! A [`RunControl`] is wrapped in [`Arc`](std::sync::Arc) and handed to one
//! run or to every run in a Monte-Carlo batch. Requesting a stop lets each
//! run finish the tick it is executing and then return; nothing is
//! interrupted mid-tick.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// The configured number of ticks completed.
    Completed,
    /// A stop was requested before the last tick.
    Stopped,
}

/// Shared stop flag and progress counter.
#[derive(Debug, Default)]
pub struct RunControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Ticks completed across every run sharing this control.
    ticks_completed: AtomicU64,
}

impl RunControl {
    /// Create a control with no stop requested.
    pub const fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            ticks_completed: AtomicU64::new(0),
        }
    }

    /// Ask every run using this control to stop after its current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Count one completed tick.
    pub fn record_tick(&self) {
        self.ticks_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Ticks completed so far.
    pub fn ticks_completed(&self) -> u64 {
        self.ticks_completed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flag_latches() {
        let control = RunControl::new();
        assert!(!control.is_stop_requested());
        control.request_stop();
        assert!(control.is_stop_requested());
        control.request_stop();
        assert!(control.is_stop_requested());
    }

    #[test]
    fn ticks_are_counted() {
        let control = RunControl::new();
        control.record_tick();
        control.record_tick();
        assert_eq!(control.ticks_completed(), 2);
    }
}
