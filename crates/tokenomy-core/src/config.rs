//! Configuration loading and typed config structures for the Tokenomy
//! simulation.
//!
//! The canonical configuration lives in `tokenomy-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads, overrides, and
//! validates the file. Every field has a default, so an empty file runs the
//! reference economy.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use tokenomy_agents::{ActivitiesConfig, ActivityEngine, PopulationConfig, TradingConfig};
use tokenomy_ledger::PoolSpec;
use tokenomy_types::PoolRole;

/// Environment variable overriding `simulation.seed`.
pub const SEED_ENV: &str = "TOKENOMY_SEED";

/// Environment variable overriding `simulation.iterations`.
pub const ITERATIONS_ENV: &str = "TOKENOMY_ITERATIONS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value violates a configuration-time invariant.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `tokenomy-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run length, seed, and recording options.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Token supply, starting price, and elasticity.
    #[serde(default)]
    pub token: TokenConfig,

    /// The pool roster.
    #[serde(default = "PoolSpec::standard_roster")]
    pub pools: Vec<PoolSpec>,

    /// Population sizes, growth, and starting balances.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Speculator trade caps.
    #[serde(default)]
    pub trading: TradingConfig,

    /// Activity parameters.
    #[serde(default)]
    pub activities: ActivitiesConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation: RunConfig::default(),
            token: TokenConfig::default(),
            pools: PoolSpec::standard_roster(),
            population: PopulationConfig::default(),
            trading: TradingConfig::default(),
            activities: ActivitiesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `TOKENOMY_SEED` overrides `simulation.seed`
    /// - `TOKENOMY_ITERATIONS` overrides `simulation.iterations`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override is not a number.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override is not a number.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override is not an unsigned
    /// integer.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SEED_ENV) {
            self.simulation.seed = parse_override(SEED_ENV, &value)?;
        }
        if let Some(value) = lookup(ITERATIONS_ENV) {
            self.simulation.iterations = parse_override(ITERATIONS_ENV, &value)?;
        }
        Ok(())
    }

    /// Check every configuration-time invariant.
    ///
    /// A configuration that passes cannot make the run abort before tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.token.validate()?;
        validate_pools(&self.pools)?;
        validate_population(&self.population)?;
        validate_trading(&self.trading)?;
        ActivityEngine::new(&self.activities).map_err(|err| invalid(err.to_string()))?;
        Ok(())
    }
}

fn parse_override(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|err| invalid(format!("{key}={value:?} is not an unsigned integer: {err}")))
}

/// Run length, seed, and recording options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Ticks per run.
    #[serde(default = "default_iterations")]
    pub iterations: u64,

    /// Seed of the run's random stream.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Ticks in one vesting month.
    #[serde(default = "default_ticks_per_month")]
    pub ticks_per_month: u64,

    /// Whether tick summaries carry structured events.
    #[serde(default)]
    pub record_events: bool,

    /// Independent runs in a Monte-Carlo batch (1 = single run).
    #[serde(default = "default_monte_carlo_runs")]
    pub monte_carlo_runs: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            seed: default_seed(),
            ticks_per_month: default_ticks_per_month(),
            record_events: false,
            monte_carlo_runs: default_monte_carlo_runs(),
        }
    }
}

impl RunConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_month == 0 {
            return Err(invalid("simulation.ticks_per_month must be at least 1"));
        }
        if self.monte_carlo_runs == 0 {
            return Err(invalid("simulation.monte_carlo_runs must be at least 1"));
        }
        Ok(())
    }
}

/// Token supply, starting price, and elasticity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenConfig {
    /// Price at tick 0.
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,

    /// Fixed total supply.
    #[serde(default = "default_total_supply")]
    pub total_supply: f64,

    /// Price sensitivity to a demand/supply imbalance, in `[0, 1]`.
    #[serde(default = "default_elasticity")]
    pub elasticity: f64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            initial_price: default_initial_price(),
            total_supply: default_total_supply(),
            elasticity: default_elasticity(),
        }
    }
}

impl TokenConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.total_supply.is_finite() && self.total_supply > 0.0) {
            return Err(invalid("token.total_supply must be positive"));
        }
        if !(self.initial_price.is_finite() && self.initial_price > 0.0) {
            return Err(invalid("token.initial_price must be positive"));
        }
        if !is_unit(self.elasticity) {
            return Err(invalid("token.elasticity must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is
    /// unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn validate_pools(pools: &[PoolSpec]) -> Result<(), ConfigError> {
    let mut roles = BTreeSet::new();
    let mut total = 0.0;
    for spec in pools {
        let role = spec.role.as_str();
        if !roles.insert(spec.role) {
            return Err(invalid(format!("pool {role} appears more than once")));
        }
        if !is_unit(spec.allocation) {
            return Err(invalid(format!("pool {role}: allocation must lie in [0, 1]")));
        }
        if !is_unit(spec.tge) {
            return Err(invalid(format!("pool {role}: tge must lie in [0, 1]")));
        }
        if spec.vesting_months == 0 && (spec.tge - 1.0).abs() > f64::EPSILON {
            return Err(invalid(format!(
                "pool {role}: vesting_months 0 requires a tge of 1.0"
            )));
        }
        if !is_unit(spec.injection_ratio) {
            return Err(invalid(format!(
                "pool {role}: injection_ratio must lie in [0, 1]"
            )));
        }
        total += spec.allocation;
    }
    if total > 1.0 + 1e-9 {
        return Err(invalid(format!(
            "pool allocations sum to {total}, more than 100 %"
        )));
    }
    for required in [PoolRole::Liquidity, PoolRole::Mining, PoolRole::Ecosystem] {
        if !roles.contains(&required) {
            return Err(invalid(format!("pool roster needs a {required} pool")));
        }
    }
    Ok(())
}

fn validate_population(population: &PopulationConfig) -> Result<(), ConfigError> {
    let rates = [population.user_growth_rate, population.speculator_growth_rate];
    if rates.iter().any(|r| !(r.is_finite() && *r >= 0.0)) {
        return Err(invalid("population growth rates must be non-negative"));
    }
    if !population.user_random_factor.is_valid() || !population.speculator_random_factor.is_valid()
    {
        return Err(invalid(
            "population random factor ranges must be finite with min <= max",
        ));
    }
    if !(population.threshold_std_dev.is_finite() && population.threshold_std_dev >= 0.0) {
        return Err(invalid("population.threshold_std_dev must be non-negative"));
    }
    Ok(())
}

fn validate_trading(trading: &TradingConfig) -> Result<(), ConfigError> {
    if !(trading.max_trade_cash.is_finite() && trading.max_trade_cash >= 0.0) {
        return Err(invalid("trading.max_trade_cash must be non-negative"));
    }
    if !is_unit(trading.max_cash_fraction) || !is_unit(trading.max_token_fraction) {
        return Err(invalid("trading fractions must lie in [0, 1]"));
    }
    Ok(())
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_iterations() -> u64 {
    1000
}

const fn default_seed() -> u64 {
    42
}

const fn default_ticks_per_month() -> u64 {
    30
}

const fn default_monte_carlo_runs() -> u32 {
    1
}

const fn default_initial_price() -> f64 {
    0.0001
}

const fn default_total_supply() -> f64 {
    500_000_000_000.0
}

const fn default_elasticity() -> f64 {
    0.05
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse_without_env(yaml: &str) -> SimulationConfig {
        let mut config: SimulationConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_overrides(no_env).unwrap();
        config
    }

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.simulation.iterations, 1000);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.pools.len(), 6);
        assert!((config.token.total_supply - 500_000_000_000.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = parse_without_env("{}");
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
simulation:
  iterations: 90
  seed: 7
  record_events: true

token:
  initial_price: 0.01
  elasticity: 0.5

pools:
  - role: liquidity
    allocation: 0.5
    tge: 1.0
    vesting_months: 0
  - role: mining
    allocation: 0.25
    tge: 0.1
    vesting_months: 12
    injection_ratio: 0.01
  - role: ecosystem
    allocation: 0.25
    tge: 0.1
    vesting_months: 12

population:
  initial_users: 10
  growth_cadence: monthly

logging:
  level: debug
  format: json
";
        let config = parse_without_env(yaml);
        assert_eq!(config.simulation.iterations, 90);
        assert!(config.simulation.record_events);
        assert!((config.token.elasticity - 0.5).abs() < f64::EPSILON);
        assert!((config.token.total_supply - 500_000_000_000.0).abs() < f64::EPSILON);
        assert_eq!(config.pools.len(), 3);
        assert_eq!(config.population.initial_users, 10);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_replace_seed_and_iterations() {
        let env: BTreeMap<&str, &str> =
            BTreeMap::from([(SEED_ENV, "99"), (ITERATIONS_ENV, " 12 ")]);
        let mut config = SimulationConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()))
            .unwrap();
        assert_eq!(config.simulation.seed, 99);
        assert_eq!(config.simulation.iterations, 12);
    }

    #[test]
    fn bad_override_rejected() {
        let mut config = SimulationConfig::default();
        let result = config.apply_overrides(|key| (key == SEED_ENV).then(|| "abc".to_owned()));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn validation_rejects_bad_token() {
        let mut config = SimulationConfig::default();
        config.token.elasticity = 1.5;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.token.initial_price = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_bad_pools() {
        let mut over = SimulationConfig::default();
        if let Some(pool) = over.pools.first_mut() {
            pool.allocation = 0.5;
        }
        assert!(over.validate().is_err());

        let mut no_liquidity = SimulationConfig::default();
        no_liquidity.pools.retain(|p| p.role != PoolRole::Liquidity);
        assert!(no_liquidity.validate().is_err());

        let mut cliff = SimulationConfig::default();
        if let Some(pool) = cliff.pools.first_mut() {
            pool.vesting_months = 0;
        }
        assert!(cliff.validate().is_err());

        let mut duplicate = SimulationConfig::default();
        let copy = duplicate.pools.first().cloned().unwrap();
        duplicate.pools.push(copy);
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn validation_rejects_bad_activities() {
        let mut config = SimulationConfig::default();
        config.activities.cooldown_options.clear();
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.activities.host.win_probability = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_month() {
        let mut config = SimulationConfig::default();
        config.simulation.ticks_per_month = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_yaml_error() {
        let result: Result<SimulationConfig, _> = serde_yml::from_str("simulation: [");
        assert!(result.is_err());
        let err: ConfigError = result.err().map(ConfigError::from).unwrap();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }
}
