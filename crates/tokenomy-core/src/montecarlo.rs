//! Monte-Carlo batch runner.
//!
//! A batch executes `runs` independent simulations of one configuration.
//! Run `i` is seeded with `seed + i` (wrapping) and owns its own token,
//! exchange, pools, agents, and random stream, so runs share nothing but
//! the read-only configuration and the [`RunControl`]. Runs execute on the
//! blocking thread pool; parallelism is at run level only.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use tokenomy_types::RunSummary;

use crate::config::{ConfigError, SimulationConfig};
use crate::operator::RunControl;
use crate::runner::{self, RunOutcome, RunnerError};
use crate::series::PRICE;

/// Errors that can occur while running a batch.
#[derive(Debug, thiserror::Error)]
pub enum MonteCarloError {
    /// The configuration failed validation.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// One run failed.
    #[error("run {index} failed: {source}")]
    Run {
        /// Index of the failed run within the batch.
        index: u64,
        /// The underlying runner error.
        source: RunnerError,
    },

    /// A run's task panicked or was cancelled.
    #[error("run task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: JoinError,
    },

    /// The batch was asked to execute zero runs.
    #[error("a batch needs at least one run")]
    NoRuns,
}

/// Summary statistics of a set of prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl PriceStats {
    /// Statistics of `values`, or `None` if there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

/// Aggregated result of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    /// Per-run terminal summaries, in run-index order.
    pub runs: Vec<RunSummary>,
    /// Mean price at each tick across every run that reached it.
    pub mean_price_path: Vec<f64>,
    /// Statistics of the runs' final prices.
    pub final_price: PriceStats,
}

/// Execute `runs` independent simulations of `config` and aggregate them.
///
/// # Errors
///
/// Returns [`MonteCarloError::NoRuns`] for an empty batch,
/// [`MonteCarloError::Config`] if the configuration is invalid, and the
/// lowest-indexed [`MonteCarloError::Run`] if any run fails.
pub async fn run_batch(
    config: Arc<SimulationConfig>,
    runs: u64,
    control: Arc<RunControl>,
) -> Result<MonteCarloReport, MonteCarloError> {
    if runs == 0 {
        return Err(MonteCarloError::NoRuns);
    }
    config.validate()?;

    let base_seed = config.simulation.seed;
    info!(
        runs,
        base_seed,
        iterations = config.simulation.iterations,
        "monte carlo batch starting"
    );

    let mut tasks = JoinSet::new();
    for index in 0..runs {
        let config = Arc::clone(&config);
        let control = Arc::clone(&control);
        let seed = base_seed.wrapping_add(index);
        tasks.spawn_blocking(move || (index, runner::run(&config, seed, &control)));
    }

    let mut outcomes: Vec<(u64, RunOutcome)> = Vec::new();
    let mut failure: Option<(u64, RunnerError)> = None;
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        match result {
            Ok(outcome) => outcomes.push((index, outcome)),
            Err(err) => {
                warn!(index, error = %err, "monte carlo run failed");
                if failure.as_ref().is_none_or(|(first, _)| index < *first) {
                    failure = Some((index, err));
                }
            }
        }
    }
    if let Some((index, source)) = failure {
        return Err(MonteCarloError::Run { index, source });
    }

    outcomes.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<RunOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();
    let report = aggregate(&outcomes).ok_or(MonteCarloError::NoRuns)?;

    info!(
        runs = report.runs.len(),
        mean_final_price = report.final_price.mean,
        std_dev = report.final_price.std_dev,
        min = report.final_price.min,
        max = report.final_price.max,
        "monte carlo batch complete"
    );
    Ok(report)
}

fn aggregate(outcomes: &[RunOutcome]) -> Option<MonteCarloReport> {
    let finals: Vec<f64> = outcomes.iter().map(|o| o.summary.final_price).collect();
    let final_price = PriceStats::from_values(&finals)?;

    let mut sums: Vec<(f64, u32)> = Vec::new();
    for path in outcomes.iter().filter_map(|o| o.series.get(PRICE)) {
        if sums.len() < path.len() {
            sums.resize(path.len(), (0.0, 0));
        }
        for (slot, price) in sums.iter_mut().zip(path) {
            slot.0 += price;
            slot.1 = slot.1.saturating_add(1);
        }
    }
    let mean_price_path = sums
        .into_iter()
        .map(|(sum, n)| if n == 0 { 0.0 } else { sum / f64::from(n) })
        .collect();

    Some(MonteCarloReport {
        runs: outcomes.iter().map(|o| o.summary.clone()).collect(),
        mean_price_path,
        final_price,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn small_config() -> Arc<SimulationConfig> {
        let mut config = SimulationConfig::default();
        config.simulation.iterations = 10;
        config.population.initial_users = 20;
        config.population.initial_speculators = 20;
        Arc::new(config)
    }

    #[tokio::test]
    async fn runs_are_seeded_in_order() {
        let report = run_batch(small_config(), 3, Arc::new(RunControl::new()))
            .await
            .unwrap();
        let seeds: Vec<u64> = report.runs.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![42, 43, 44]);
        assert_eq!(report.mean_price_path.len(), 10);
        assert!(report.final_price.min <= report.final_price.mean);
        assert!(report.final_price.mean <= report.final_price.max);
    }

    #[tokio::test]
    async fn batches_are_reproducible() {
        let first = run_batch(small_config(), 2, Arc::new(RunControl::new()))
            .await
            .unwrap();
        let second = run_batch(small_config(), 2, Arc::new(RunControl::new()))
            .await
            .unwrap();
        assert_eq!(first.mean_price_path, second.mean_price_path);
        assert_eq!(first.final_price, second.final_price);
    }

    #[tokio::test]
    async fn empty_batch_rejected() {
        let result = run_batch(small_config(), 0, Arc::new(RunControl::new())).await;
        assert!(matches!(result, Err(MonteCarloError::NoRuns)));
    }

    #[tokio::test]
    async fn shared_stop_ends_every_run() {
        let control = Arc::new(RunControl::new());
        control.request_stop();
        let report = run_batch(small_config(), 2, control).await.unwrap();
        assert!(report.runs.iter().all(|r| r.ticks == 0));
        assert!(report.mean_price_path.is_empty());
    }

    #[test]
    fn price_stats() {
        let stats = PriceStats::from_values(&[1.0, 3.0]).unwrap();
        assert!((stats.mean - 2.0).abs() < 1e-12);
        assert!((stats.std_dev - 1.0).abs() < 1e-12);
        assert!((stats.min - 1.0).abs() < f64::EPSILON);
        assert!((stats.max - 3.0).abs() < f64::EPSILON);
        assert!(PriceStats::from_values(&[]).is_none());
    }
}
