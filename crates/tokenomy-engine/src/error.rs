//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of loading a configuration,
//! running a simulation or batch, and writing the output file.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tokenomy_core::ConfigError,
    },

    /// Simulation state could not be built.
    #[error("setup error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: tokenomy_core::TickError,
    },

    /// A single run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: tokenomy_core::RunnerError,
    },

    /// A Monte-Carlo batch failed.
    #[error("monte carlo error: {source}")]
    MonteCarlo {
        /// The underlying batch error.
        #[from]
        source: tokenomy_core::MonteCarloError,
    },

    /// The blocking simulation task panicked or was cancelled.
    #[error("simulation task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// The output could not be serialized.
    #[error("failed to serialize output: {source}")]
    Serialize {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// The output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Output {
        /// Destination path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
