//! Per-tick reporting series.
//!
//! Each series is an ordered sequence with one value per tick, keyed by a
//! stable name. Keys that depend on a pool or activity use its snake-case
//! key after a dot, e.g. `released.mining` or `threshold.host`.

use std::collections::BTreeMap;

use serde::Serialize;

use tokenomy_types::TickSnapshot;

/// Series of token prices.
pub const PRICE: &str = "price";

/// Named per-tick series accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SeriesRecorder {
    series: BTreeMap<String, Vec<f64>>,
}

impl SeriesRecorder {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            series: BTreeMap::new(),
        }
    }

    /// Append one value to every series from `snapshot`.
    pub fn record(&mut self, snapshot: &TickSnapshot) {
        self.push(PRICE, snapshot.price);
        self.push("circulating_supply", snapshot.circulating_supply);
        self.push("exchange_available", snapshot.exchange_available);
        self.push("tokens_on_market", snapshot.tokens_on_market);
        self.push("mean_user_utility", snapshot.mean_user_utility);
        self.push(
            "mean_speculator_buy_utility",
            snapshot.mean_speculator_buy_utility,
        );
        self.push(
            "mean_speculator_sell_utility",
            snapshot.mean_speculator_sell_utility,
        );
        self.push("users", snapshot.users as f64);
        self.push("speculators", snapshot.speculators as f64);
        for (role, pool) in &snapshot.pools {
            self.push(&format!("released.{role}"), pool.released);
            self.push(&format!("pool_tokens_on_market.{role}"), pool.tokens_on_market);
        }
        for (kind, threshold) in &snapshot.activity_thresholds {
            self.push(&format!("threshold.{kind}"), *threshold);
        }
    }

    /// The series named `name`.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// Series names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Ticks recorded so far.
    pub fn len(&self) -> usize {
        self.get(PRICE).map_or(0, <[f64]>::len)
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the recorder, returning the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, Vec<f64>> {
        self.series
    }

    fn push(&mut self, name: &str, value: f64) {
        if let Some(values) = self.series.get_mut(name) {
            values.push(value);
        } else {
            self.series.insert(name.to_owned(), vec![value]);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokenomy_types::{ActivityKind, PoolRole, PoolSnapshot};

    use super::*;

    fn snapshot(tick: u64, price: f64) -> TickSnapshot {
        TickSnapshot {
            tick,
            price,
            circulating_supply: 10.0,
            exchange_available: 5.0,
            tokens_on_market: 10.0,
            pools: BTreeMap::from([(PoolRole::Mining, PoolSnapshot::default())]),
            mean_user_utility: 1.0,
            mean_speculator_buy_utility: 2.0,
            mean_speculator_sell_utility: 3.0,
            activity_thresholds: BTreeMap::from([(ActivityKind::Host, 50.0)]),
            users: 4,
            speculators: 2,
        }
    }

    #[test]
    fn one_value_per_tick() {
        let mut recorder = SeriesRecorder::new();
        recorder.record(&snapshot(0, 1.0));
        recorder.record(&snapshot(1, 1.5));
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.get(PRICE).unwrap().len(), 2);
        assert_eq!(recorder.get("released.mining").unwrap().len(), 2);
        assert_eq!(recorder.get("threshold.host").unwrap().len(), 2);
        assert!(recorder.get("released.liquidity").is_none());
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut recorder = SeriesRecorder::new();
        recorder.record(&snapshot(0, 2.0));
        let json = serde_json::to_value(&recorder).unwrap();
        assert_eq!(json["price"][0], 2.0);
        assert_eq!(json["users"][0], 4.0);
    }
}
