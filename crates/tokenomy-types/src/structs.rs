//! Snapshot and summary structs handed to the reporting layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActivityKind, PoolRole};
use crate::ids::RunId;

/// Per-pool state observed at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PoolSnapshot {
    /// Cumulative tokens vested so far.
    pub released: f64,
    /// Vested tokens not yet placed on the market.
    pub available_unreleased: f64,
    /// Cumulative tokens the pool has placed on the market.
    pub tokens_on_market: f64,
    /// Cash received for market deposits (investor pools only).
    pub cash: f64,
}

/// Everything the reporting layer records for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickSnapshot {
    /// Tick number (0-based).
    pub tick: u64,
    /// Token price after this tick's price update.
    pub price: f64,
    /// Circulating supply after this tick.
    pub circulating_supply: f64,
    /// Tokens currently available for purchase on the exchange.
    pub exchange_available: f64,
    /// Cumulative tokens placed on the market by all pools.
    pub tokens_on_market: f64,
    /// Per-pool counters.
    pub pools: BTreeMap<PoolRole, PoolSnapshot>,
    /// Mean activity utility across regular users.
    pub mean_user_utility: f64,
    /// Mean buy utility across speculators.
    pub mean_speculator_buy_utility: f64,
    /// Mean sell utility across speculators.
    pub mean_speculator_sell_utility: f64,
    /// Dynamic participation threshold per activity.
    pub activity_thresholds: BTreeMap<ActivityKind, f64>,
    /// Regular users on the roster.
    pub users: u64,
    /// Speculators on the roster.
    pub speculators: u64,
}

/// Terminal summary produced once when a run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunSummary {
    /// Identifier of the run.
    pub run_id: RunId,
    /// Seed the run's random stream was built from.
    pub seed: u64,
    /// Ticks that were executed.
    pub ticks: u64,
    /// Price at the start of the run.
    pub initial_price: f64,
    /// Price after the last tick.
    pub final_price: f64,
    /// Percentage change from initial to final price.
    pub price_change_pct: f64,
    /// Circulating supply after the last tick.
    pub circulating_supply: f64,
    /// Cumulative tokens placed on the market by all pools.
    pub total_tokens_on_market: f64,
    /// Cumulative tokens burned.
    pub total_burned: f64,
    /// Administrator token balance.
    pub administrator_tokens: f64,
    /// Cumulative fees received by the administrator.
    pub administrator_fees: f64,
    /// Number of ticks where holdings did not sum to circulating supply.
    pub conservation_anomalies: u64,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Percentage change between two prices; zero when `initial` is not positive.
    pub fn percent_change(initial: f64, final_price: f64) -> f64 {
        if initial > 0.0 {
            (final_price - initial) / initial * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_change_handles_zero_initial() {
        assert!(RunSummary::percent_change(0.0, 5.0).abs() < f64::EPSILON);
        assert!((RunSummary::percent_change(2.0, 3.0) - 50.0).abs() < 1e-9);
        assert!((RunSummary::percent_change(2.0, 1.0) + 50.0).abs() < 1e-9);
    }
}
