//! Per-pool release schedule: a TGE lump sum followed by linear monthly
//! vesting.
//!
//! ```text
//! Unvested --tick 0--> TgeReleased --month m, m <= months--> Vesting
//!                                              --m == months--> FullyVested
//! ```
//!
//! The schedule remembers the last tick it processed, so asking twice for
//! the same tick releases nothing the second time.

use tokenomy_types::PoolRole;

use crate::VestingError;

/// Position of a pool in its vesting lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VestingPhase {
    /// Tick 0 has not been processed yet.
    Unvested,
    /// The TGE amount has been released; monthly releases may follow.
    Vesting,
    /// Every scheduled release has happened.
    FullyVested,
}

/// TGE fraction and linear vesting months for one pool.
#[derive(Debug, Clone)]
pub struct VestingSchedule {
    tge_fraction: f64,
    vesting_months: u32,
    ticks_per_month: u64,
    last_tick: Option<u64>,
}

impl VestingSchedule {
    /// Build a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`VestingError::InvalidSchedule`] if the TGE fraction is
    /// outside `[0, 1]`, if a month has zero ticks, or if a schedule with no
    /// vesting months would leave part of the allocation unreleased.
    pub fn new(
        role: PoolRole,
        tge_fraction: f64,
        vesting_months: u32,
        ticks_per_month: u64,
    ) -> Result<Self, VestingError> {
        if !(0.0..=1.0).contains(&tge_fraction) {
            return Err(VestingError::InvalidSchedule {
                role,
                reason: "tge fraction must be within [0, 1]",
            });
        }
        if ticks_per_month == 0 {
            return Err(VestingError::InvalidSchedule {
                role,
                reason: "a month must span at least one tick",
            });
        }
        if vesting_months == 0 && tge_fraction < 1.0 {
            return Err(VestingError::InvalidSchedule {
                role,
                reason: "zero vesting months requires a full TGE release",
            });
        }
        Ok(Self {
            tge_fraction,
            vesting_months,
            ticks_per_month,
            last_tick: None,
        })
    }

    /// Fraction of the allocation released at TGE.
    pub const fn tge_fraction(&self) -> f64 {
        self.tge_fraction
    }

    /// Number of linear monthly releases after TGE.
    pub const fn vesting_months(&self) -> u32 {
        self.vesting_months
    }

    /// The last tick this schedule processed.
    pub const fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Where the schedule stands after the last processed tick.
    pub fn phase(&self) -> VestingPhase {
        match self.last_tick {
            None => VestingPhase::Unvested,
            Some(tick) => {
                let months_done = tick.checked_div(self.ticks_per_month).unwrap_or(0);
                if months_done >= u64::from(self.vesting_months) {
                    VestingPhase::FullyVested
                } else {
                    VestingPhase::Vesting
                }
            }
        }
    }

    /// Amount of `total_allocation` due at `tick`.
    ///
    /// Returns zero for ticks that are not release points and for ticks at
    /// or before the last processed tick.
    pub fn due(&mut self, tick: u64, total_allocation: f64) -> f64 {
        if self.last_tick.is_some_and(|last| tick <= last) {
            return 0.0;
        }
        self.last_tick = Some(tick);

        if tick == 0 {
            return total_allocation * self.tge_fraction;
        }
        if tick.checked_rem(self.ticks_per_month) != Some(0) || self.vesting_months == 0 {
            return 0.0;
        }
        let month = tick.checked_div(self.ticks_per_month).unwrap_or(0);
        if month > u64::from(self.vesting_months) {
            return 0.0;
        }
        total_allocation * (1.0 - self.tge_fraction) / f64::from(self.vesting_months)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn schedule(tge: f64, months: u32) -> VestingSchedule {
        VestingSchedule::new(PoolRole::Mining, tge, months, 30).unwrap()
    }

    #[test]
    fn tge_released_at_tick_zero() {
        let mut s = schedule(0.1, 36);
        assert!((s.due(0, 1_000.0) - 100.0).abs() < 1e-9);
        assert_eq!(s.phase(), VestingPhase::Vesting);
    }

    #[test]
    fn repeated_tick_is_noop() {
        let mut s = schedule(0.1, 36);
        assert!(s.due(0, 1_000.0) > 0.0);
        assert!(s.due(0, 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn monthly_release_on_month_boundary() {
        let mut s = schedule(0.2, 12);
        s.due(0, 1_200.0);
        assert!(s.due(15, 1_200.0).abs() < f64::EPSILON);
        assert!((s.due(30, 1_200.0) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn releases_sum_to_allocation() {
        let mut s = schedule(0.15, 24);
        let total: f64 = (0..=900).map(|t| s.due(t, 10_000.0)).sum();
        assert!((total - 10_000.0).abs() < 1e-6);
        assert_eq!(s.phase(), VestingPhase::FullyVested);
    }

    #[test]
    fn zero_months_releases_everything_at_tge() {
        let mut s = schedule(1.0, 0);
        assert!((s.due(0, 500.0) - 500.0).abs() < 1e-9);
        assert!(s.due(30, 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_schedules_rejected() {
        assert!(VestingSchedule::new(PoolRole::Liquidity, 0.5, 0, 30).is_err());
        assert!(VestingSchedule::new(PoolRole::Liquidity, 1.5, 12, 30).is_err());
        assert!(VestingSchedule::new(PoolRole::Liquidity, 0.5, 12, 0).is_err());
    }
}
