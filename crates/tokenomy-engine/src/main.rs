//! Command-line driver for the Tokenomy simulation.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first argument, `TOKENOMY_CONFIG`, or
//!    `tokenomy-config.yaml`; defaults when the file is absent)
//! 2. Initialize structured logging (tracing)
//! 3. Validate the configuration
//! 4. Run a single simulation, or a Monte-Carlo batch when
//!    `simulation.monte_carlo_runs` is greater than 1
//! 5. Log the result and, if an output path was given (second argument or
//!    `TOKENOMY_OUTPUT`), write it as JSON
//!
//! Ctrl-C requests a cooperative stop: each run finishes its current tick
//! and returns what it has.

mod error;
mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tokenomy_core::runner::{self, RunOutcome};
use tokenomy_core::{
    LogFormat, LoggingConfig, MonteCarloReport, RunControl, SeriesRecorder, SimulationConfig,
    SimulationState, run_batch,
};
use tokenomy_types::{RunSummary, SimEvent};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;

const DEFAULT_CONFIG_PATH: &str = "tokenomy-config.yaml";
const CONFIG_ENV: &str = "TOKENOMY_CONFIG";
const OUTPUT_ENV: &str = "TOKENOMY_OUTPUT";

/// JSON output of a single run.
#[derive(Serialize)]
struct RunOutput<'a> {
    summary: &'a RunSummary,
    series: &'a SeriesRecorder,
    events: &'a [SimEvent],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let output_path = args
        .next()
        .or_else(|| std::env::var(OUTPUT_ENV).ok())
        .map(PathBuf::from);

    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    init_logging(&config.logging);
    config.validate()?;

    info!(
        config = %config_path.display(),
        seed = config.simulation.seed,
        iterations = config.simulation.iterations,
        runs = config.simulation.monte_carlo_runs,
        users = config.population.initial_users,
        speculators = config.population.initial_speculators,
        "tokenomy-engine starting"
    );

    let control = Arc::new(RunControl::new());
    stop_on_interrupt(Arc::clone(&control));

    let runs = u64::from(config.simulation.monte_carlo_runs);
    let json = if runs > 1 {
        let report = run_monte_carlo(config, runs, Arc::clone(&control)).await?;
        log_report(&report);
        render(&report)?
    } else {
        let (outcome, events) = run_single(config, Arc::clone(&control)).await?;
        runner::log_run_end(&outcome);
        render(&RunOutput {
            summary: &outcome.summary,
            series: &outcome.series,
            events: &events,
        })?
    };

    if let Some(path) = output_path {
        write_output(&path, &json)?;
        info!(path = %path.display(), bytes = json.len(), "output written");
    }

    info!(
        ticks = control.ticks_completed(),
        "tokenomy-engine shutdown complete"
    );
    Ok(())
}

/// Load the configuration from `path`, or defaults if it does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        // Logging is not up yet.
        eprintln!("{} not found, using defaults", path.display());
        Ok(SimulationConfig::parse("{}")?)
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Request a cooperative stop on Ctrl-C.
fn stop_on_interrupt(control: Arc<RunControl>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current tick");
            control.request_stop();
        }
    });
}

/// Run one simulation on the blocking pool.
async fn run_single(
    config: SimulationConfig,
    control: Arc<RunControl>,
) -> Result<(RunOutcome, Vec<SimEvent>), EngineError> {
    tokio::task::spawn_blocking(move || {
        let mut state = SimulationState::new(&config)?;
        let mut callback = ProgressCallback::new();
        let outcome = runner::run_simulation(
            &mut state,
            config.simulation.iterations,
            &control,
            &mut callback,
        )?;
        Ok::<_, EngineError>((outcome, callback.into_events()))
    })
    .await?
}

/// Run a Monte-Carlo batch of `runs` seeded runs.
async fn run_monte_carlo(
    config: SimulationConfig,
    runs: u64,
    control: Arc<RunControl>,
) -> Result<MonteCarloReport, EngineError> {
    Ok(run_batch(Arc::new(config), runs, control).await?)
}

fn log_report(report: &MonteCarloReport) {
    let anomalies: u64 = report.runs.iter().map(|r| r.conservation_anomalies).sum();
    info!(
        runs = report.runs.len(),
        ticks = report.mean_price_path.len(),
        mean_final_price = report.final_price.mean,
        std_dev = report.final_price.std_dev,
        min = report.final_price.min,
        max = report.final_price.max,
        anomalies,
        "monte carlo batch ended"
    );
}

fn render<T: Serialize>(value: &T) -> Result<String, EngineError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn write_output(path: &Path, json: &str) -> Result<(), EngineError> {
    std::fs::write(path, json).map_err(|source| EngineError::Output {
        path: path.to_path_buf(),
        source,
    })
}
