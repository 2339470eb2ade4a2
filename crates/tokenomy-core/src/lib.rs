//! Configuration, month clock, tick cycle, and run orchestration for the
//! Tokenomy simulation.
//!
//! This crate owns the tick cycle that drives one run of the economy:
//! Vesting, Injection, Growth, Activities, Trading, Pricing, and
//! Verification.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and month calendar.
//! - [`config`] -- Configuration loading from `tokenomy-config.yaml` into
//!   strongly-typed structs, with environment overrides and validation.
//! - [`montecarlo`] -- Independent seeded runs in parallel, aggregated into a
//!   mean price path and final-price statistics.
//! - [`operator`] -- [`RunControl`]: the shared cooperative stop flag.
//! - [`runner`] -- The run loop around [`run_tick`].
//! - [`series`] -- Per-tick reporting series.
//! - [`tick`] -- The seven-phase tick cycle.
//!
//! [`RunControl`]: operator::RunControl
//! [`run_tick`]: tick::run_tick

pub mod clock;
pub mod config;
pub mod montecarlo;
pub mod operator;
pub mod runner;
pub mod series;
pub mod tick;

pub use clock::{ClockError, SimulationClock};
pub use config::{ConfigError, LogFormat, LoggingConfig, SimulationConfig};
pub use montecarlo::{MonteCarloError, MonteCarloReport, PriceStats, run_batch};
pub use operator::{RunControl, RunEndReason};
pub use runner::{NoOpCallback, RunOutcome, RunnerError, TickCallback, run, run_simulation};
pub use series::SeriesRecorder;
pub use tick::{SimulationState, TickError, TickSummary, run_tick};
