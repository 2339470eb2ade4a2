//! Whole-run behavior: conservation over a full run, determinism under a
//! fixed seed, and cooperative stop.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use tokenomy_core::config::SimulationConfig;
use tokenomy_core::tick::{SimulationState, run_tick};
use tokenomy_core::{RunControl, RunEndReason, run, run_batch};
use tokenomy_ledger::conservation::approx_eq;
use tokenomy_types::{PoolRole, SimEvent};

fn config(iterations: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.simulation.iterations = iterations;
    config.population.initial_users = 100;
    config.population.initial_speculators = 100;
    config.population.max_users = 300;
    config.population.max_speculators = 300;
    config
}

#[test]
fn holdings_match_circulating_supply_every_tick() {
    let mut state = SimulationState::new(&config(0)).unwrap();
    for _ in 0..120 {
        let summary = run_tick(&mut state).unwrap();
        assert!(summary.balanced, "tick {} unbalanced", summary.tick);
        assert!(approx_eq(state.holdings(), state.token.circulating_supply()));
        assert!(state.token.circulating_supply() <= state.token.total_supply());
        assert!(state.population.balances_valid());
        for pool in state.pools.iter() {
            assert!(pool.available_unreleased() >= 0.0);
            assert!(pool.released() <= pool.total_allocation() * (1.0 + 1e-9));
        }
    }
    assert_eq!(state.conservation_anomalies, 0);
}

#[test]
fn liquidity_vests_fully_at_launch() {
    let mut state = SimulationState::new(&config(0)).unwrap();
    run_tick(&mut state).unwrap();
    let liquidity = state.pools.get(PoolRole::Liquidity).unwrap();
    assert!(approx_eq(liquidity.released(), liquidity.total_allocation()));
}

#[test]
fn same_seed_same_run() {
    let config = config(60);
    let first = run(&config, 11, &RunControl::new()).unwrap();
    let second = run(&config, 11, &RunControl::new()).unwrap();
    assert_eq!(first.series, second.series);
    assert_eq!(first.final_snapshot, second.final_snapshot);
}

#[test]
fn different_seeds_diverge() {
    let config = config(60);
    let first = run(&config, 1, &RunControl::new()).unwrap();
    let second = run(&config, 2, &RunControl::new()).unwrap();
    assert_ne!(first.series, second.series);
}

#[test]
fn run_ends_early_on_stop() {
    let control = RunControl::new();
    control.request_stop();
    let outcome = run(&config(30), 3, &control).unwrap();
    assert_eq!(outcome.end_reason, RunEndReason::Stopped);
    assert_eq!(outcome.summary.ticks, 0);
    assert!(outcome.series.is_empty());
}

#[test]
fn recorded_events_cover_pricing_every_tick() {
    let mut config = config(0);
    config.simulation.record_events = true;
    let mut state = SimulationState::new(&config).unwrap();
    for _ in 0..5 {
        let summary = run_tick(&mut state).unwrap();
        let priced = summary
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::PriceUpdated { .. }))
            .count();
        assert_eq!(priced, 1);
    }
}

#[tokio::test]
async fn batch_of_runs_matches_single_runs() {
    let config = config(20);
    let single = run(&config, config.simulation.seed, &RunControl::new()).unwrap();
    let report = run_batch(Arc::new(config), 3, Arc::new(RunControl::new()))
        .await
        .unwrap();
    assert_eq!(report.runs.len(), 3);
    assert!(approx_eq(
        report.runs.first().unwrap().final_price,
        single.summary.final_price
    ));
}

#[test]
fn shipped_config_matches_defaults() {
    let yaml = include_str!("../../../tokenomy-config.yaml");
    let shipped: SimulationConfig = serde_yml::from_str(yaml).unwrap();
    shipped.validate().unwrap();
    assert_eq!(shipped, SimulationConfig::default());
}
