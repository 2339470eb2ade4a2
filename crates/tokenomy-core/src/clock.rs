//! Simulation clock: the tick counter and the month calendar.
//!
//! One tick is one simulated day. The clock holds the number of the tick
//! about to run, so the first tick processed is tick 0, the token
//! generation event. Months are derived from the tick counter and never
//! stored independently.
//!
//! All derivations use checked arithmetic.

use crate::config::RunConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. zero ticks per month).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Tick counter with a fixed-length month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationClock {
    /// Tick about to run.
    tick: u64,

    /// Ticks in one month (at least 1).
    ticks_per_month: u64,
}

impl SimulationClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_month` is 0.
    pub fn new(config: &RunConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, config.ticks_per_month)
    }

    /// Create a clock from explicit parameters (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_month` is 0.
    pub fn from_parts(tick: u64, ticks_per_month: u64) -> Result<Self, ClockError> {
        if ticks_per_month == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_month must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            ticks_per_month,
        })
    }

    /// Advance to the next tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// The tick about to run.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Configured ticks per month.
    pub const fn ticks_per_month(&self) -> u64 {
        self.ticks_per_month
    }

    /// Month index of the current tick (tick 0 is in month 0).
    pub fn month(&self) -> u64 {
        self.tick.checked_div(self.ticks_per_month).unwrap_or(0)
    }

    /// Whether the current tick starts a month (tick 0 included).
    pub fn is_month_boundary(&self) -> bool {
        self.tick.checked_rem(self.ticks_per_month) == Some(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn clock() -> SimulationClock {
        SimulationClock::new(&RunConfig::default()).unwrap()
    }

    #[test]
    fn clock_starts_at_tick_zero() {
        let clock = clock();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.month(), 0);
        assert!(clock.is_month_boundary());
    }

    #[test]
    fn months_roll_every_thirty_ticks() {
        let mut clock = clock();
        for _ in 0..29 {
            clock.advance().unwrap();
            assert!(!clock.is_month_boundary());
        }
        assert_eq!(clock.advance().unwrap(), 30);
        assert!(clock.is_month_boundary());
        assert_eq!(clock.month(), 1);
    }

    #[test]
    fn zero_month_rejected() {
        assert!(matches!(
            SimulationClock::from_parts(0, 0),
            Err(ClockError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn overflow_detected() {
        let mut clock = SimulationClock::from_parts(u64::MAX, 30).unwrap();
        assert_eq!(clock.advance(), Err(ClockError::TickOverflow));
    }
}
