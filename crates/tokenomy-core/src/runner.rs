//! Simulation loop runner with cooperative stop.
//!
//! This module provides [`run_simulation`], which drives the tick loop for a
//! fixed number of iterations and honors a stop request between ticks, and
//! [`run`], which validates a configuration, builds the state, and runs it.
//!
//! A run is strictly sequential. Parallelism happens only across runs, see
//! [`montecarlo`](crate::montecarlo).

use chrono::Utc;
use tracing::info;

use tokenomy_types::{RunId, RunSummary, TickSnapshot};

use crate::config::{ConfigError, SimulationConfig};
use crate::operator::{RunControl, RunEndReason};
use crate::series::SeriesRecorder;
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration failed validation.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Terminal summary.
    pub summary: RunSummary,
    /// Per-tick series.
    pub series: SeriesRecorder,
    /// Snapshot after the last executed tick, if any tick ran.
    pub final_snapshot: Option<TickSnapshot>,
    /// Why the run ended.
    pub end_reason: RunEndReason,
}

/// Callback invoked after each tick completes.
///
/// Implementations can stream snapshots, collect events, or drive a
/// progress display. The callback receives the tick summary and the
/// current simulation state.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Run `iterations` ticks on `state`, stopping early if `control` asks.
///
/// The stop flag is checked before every tick, so a requested stop lets
/// the tick in progress finish.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] if a tick fails unrecoverably.
pub fn run_simulation(
    state: &mut SimulationState,
    iterations: u64,
    control: &RunControl,
    callback: &mut dyn TickCallback,
) -> Result<RunOutcome, RunnerError> {
    let run_id = RunId::new();
    let started_at = Utc::now();
    let initial_price = state.token.price();
    let mut series = SeriesRecorder::new();
    let mut final_snapshot = None;
    let mut ticks: u64 = 0;
    let mut end_reason = RunEndReason::Completed;

    info!(
        run_id = %run_id,
        seed = state.seed(),
        iterations,
        users = state.population.users.len(),
        speculators = state.population.speculators.len(),
        "simulation starting"
    );

    while ticks < iterations {
        if control.is_stop_requested() {
            info!(run_id = %run_id, ticks, "stop requested");
            end_reason = RunEndReason::Stopped;
            break;
        }

        let summary = tick::run_tick(state)?;
        ticks = ticks.saturating_add(1);
        control.record_tick();
        series.record(&summary.snapshot);
        callback.on_tick(&summary, state);
        final_snapshot = Some(summary.snapshot);
    }

    let final_price = state.token.price();
    let summary = RunSummary {
        run_id,
        seed: state.seed(),
        ticks,
        initial_price,
        final_price,
        price_change_pct: RunSummary::percent_change(initial_price, final_price),
        circulating_supply: state.token.circulating_supply(),
        total_tokens_on_market: state.pools.total_tokens_on_market(),
        total_burned: state.token.total_burned(),
        administrator_tokens: state.administrator.tokens,
        administrator_fees: state.administrator.fees_received,
        conservation_anomalies: state.conservation_anomalies,
        started_at,
        finished_at: Utc::now(),
    };

    Ok(RunOutcome {
        summary,
        series,
        final_snapshot,
        end_reason,
    })
}

/// Validate `config`, build its state with `seed`, and run it to the
/// configured iteration count.
///
/// # Errors
///
/// Returns [`RunnerError::Config`] if the configuration is invalid, or
/// [`RunnerError::Tick`] if the state cannot be built or a tick fails.
pub fn run(
    config: &SimulationConfig,
    seed: u64,
    control: &RunControl,
) -> Result<RunOutcome, RunnerError> {
    config.validate()?;
    let mut state = SimulationState::with_seed(config, seed)?;
    run_simulation(
        &mut state,
        config.simulation.iterations,
        control,
        &mut NoOpCallback,
    )
}

/// Log the end of a run.
pub fn log_run_end(outcome: &RunOutcome) {
    let summary = &outcome.summary;
    info!(
        run_id = %summary.run_id,
        reason = ?outcome.end_reason,
        ticks = summary.ticks,
        initial_price = summary.initial_price,
        final_price = summary.final_price,
        price_change_pct = summary.price_change_pct,
        circulating = summary.circulating_supply,
        burned = summary.total_burned,
        administrator_tokens = summary.administrator_tokens,
        administrator_fees = summary.administrator_fees,
        anomalies = summary.conservation_anomalies,
        "simulation ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn small_config(iterations: u64) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.simulation.iterations = iterations;
        config.population.initial_users = 20;
        config.population.initial_speculators = 20;
        config
    }

    #[test]
    fn runs_configured_iterations() {
        let outcome = run(&small_config(5), 7, &RunControl::new()).unwrap();
        assert_eq!(outcome.end_reason, RunEndReason::Completed);
        assert_eq!(outcome.summary.ticks, 5);
        assert_eq!(outcome.summary.seed, 7);
        assert_eq!(outcome.series.len(), 5);
        assert_eq!(outcome.final_snapshot.unwrap().tick, 4);
    }

    #[test]
    fn zero_iterations_is_empty() {
        let outcome = run(&small_config(0), 7, &RunControl::new()).unwrap();
        assert_eq!(outcome.summary.ticks, 0);
        assert!(outcome.series.is_empty());
        assert!(outcome.final_snapshot.is_none());
        assert!(outcome.summary.price_change_pct.abs() < f64::EPSILON);
    }

    #[test]
    fn stop_before_start_runs_nothing() {
        let control = RunControl::new();
        control.request_stop();
        let outcome = run(&small_config(10), 7, &control).unwrap();
        assert_eq!(outcome.end_reason, RunEndReason::Stopped);
        assert_eq!(outcome.summary.ticks, 0);
    }

    #[test]
    fn callback_can_stop_mid_run() {
        struct StopAfter<'a> {
            control: &'a RunControl,
            after: u64,
            seen: u64,
        }
        impl TickCallback for StopAfter<'_> {
            fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {
                self.seen = self.seen.saturating_add(1);
                if self.seen >= self.after {
                    self.control.request_stop();
                }
            }
        }

        let config = small_config(50);
        let control = RunControl::new();
        let mut state = SimulationState::new(&config).unwrap();
        let mut callback = StopAfter {
            control: &control,
            after: 3,
            seen: 0,
        };
        let outcome = run_simulation(&mut state, 50, &control, &mut callback).unwrap();
        assert_eq!(outcome.end_reason, RunEndReason::Stopped);
        assert_eq!(outcome.summary.ticks, 3);
        assert_eq!(control.ticks_completed(), 3);
    }

    #[test]
    fn invalid_config_rejected_before_tick_zero() {
        let mut config = small_config(5);
        config.token.total_supply = 0.0;
        assert!(matches!(
            run(&config, 7, &RunControl::new()),
            Err(RunnerError::Config { .. })
        ));
    }
}
