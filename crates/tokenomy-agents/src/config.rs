//! Tunable parameters for agents, trading, and activities.
//!
//! These structs mirror the `population`, `trading`, and `activities`
//! sections of `tokenomy-config.yaml`. Every field has a default matching
//! the reference economy so a partial YAML file is always valid input.

use serde::Deserialize;

/// When the growth model adds agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthCadence {
    /// Grow on every tick.
    #[default]
    Daily,
    /// Grow only on month-boundary ticks.
    Monthly,
}

/// A closed numeric range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct UniformRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl UniformRange {
    /// Whether the range is finite and ordered.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Population sizes, growth, starting balances, and utility coefficients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Regular users before the first tick.
    #[serde(default = "default_initial_users")]
    pub initial_users: usize,

    /// Speculators before the first tick.
    #[serde(default = "default_initial_speculators")]
    pub initial_speculators: usize,

    /// Fractional user growth per growth step (0.01 = 1 %).
    #[serde(default = "default_growth_rate")]
    pub user_growth_rate: f64,

    /// Fractional speculator growth per growth step.
    #[serde(default = "default_growth_rate")]
    pub speculator_growth_rate: f64,

    /// Whether growth happens every tick or on month boundaries.
    #[serde(default)]
    pub growth_cadence: GrowthCadence,

    /// Upper bound on regular users.
    #[serde(default = "default_max_agents")]
    pub max_users: usize,

    /// Upper bound on speculators.
    #[serde(default = "default_max_agents")]
    pub max_speculators: usize,

    /// Starting cash per regular user.
    #[serde(default = "default_user_cash")]
    pub user_cash: f64,

    /// Starting cash per speculator.
    #[serde(default = "default_speculator_cash")]
    pub speculator_cash: f64,

    /// Starting cash for the brand.
    #[serde(default = "default_sponsor_cash")]
    pub brand_cash: f64,

    /// Starting cash for the data partner.
    #[serde(default = "default_sponsor_cash")]
    pub data_partner_cash: f64,

    /// Range of the user activity-utility random factor.
    #[serde(default = "default_user_random_factor")]
    pub user_random_factor: UniformRange,

    /// Range of the speculator utility random factor.
    #[serde(default = "default_speculator_random_factor")]
    pub speculator_random_factor: UniformRange,

    /// Fixed data utility of every regular user.
    #[serde(default = "default_data_utility")]
    pub data_utility: f64,

    /// Mean of the speculator buy/sell threshold distribution.
    #[serde(default = "default_threshold_mean")]
    pub threshold_mean: f64,

    /// Standard deviation of the speculator buy/sell threshold distribution.
    #[serde(default = "default_threshold_std_dev")]
    pub threshold_std_dev: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_users: default_initial_users(),
            initial_speculators: default_initial_speculators(),
            user_growth_rate: default_growth_rate(),
            speculator_growth_rate: default_growth_rate(),
            growth_cadence: GrowthCadence::default(),
            max_users: default_max_agents(),
            max_speculators: default_max_agents(),
            user_cash: default_user_cash(),
            speculator_cash: default_speculator_cash(),
            brand_cash: default_sponsor_cash(),
            data_partner_cash: default_sponsor_cash(),
            user_random_factor: default_user_random_factor(),
            speculator_random_factor: default_speculator_random_factor(),
            data_utility: default_data_utility(),
            threshold_mean: default_threshold_mean(),
            threshold_std_dev: default_threshold_std_dev(),
        }
    }
}

/// Per-trade caps on speculator orders.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradingConfig {
    /// Maximum cash a single buy may spend.
    #[serde(default = "default_max_trade_cash")]
    pub max_trade_cash: f64,

    /// Maximum fraction of its cash a speculator spends on one buy.
    #[serde(default = "default_max_fraction")]
    pub max_cash_fraction: f64,

    /// Maximum fraction of its tokens a speculator sells at once.
    #[serde(default = "default_max_fraction")]
    pub max_token_fraction: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            max_trade_cash: default_max_trade_cash(),
            max_cash_fraction: default_max_fraction(),
            max_token_fraction: default_max_fraction(),
        }
    }
}

/// Parameters of a stake-and-win activity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StakeActivityConfig {
    /// Tokens the user must stake.
    #[serde(default = "default_stake")]
    pub stake: f64,

    /// Tokens paid out on a win (gross, before the stake is deducted).
    #[serde(default = "default_standard_reward")]
    pub reward: f64,

    /// Probability of winning the draw.
    #[serde(default = "default_stake_win_probability")]
    pub win_probability: f64,

    /// Base participation threshold.
    #[serde(default = "default_stake_threshold")]
    pub threshold: f64,
}

impl Default for StakeActivityConfig {
    fn default() -> Self {
        Self {
            stake: default_stake(),
            reward: default_standard_reward(),
            win_probability: default_stake_win_probability(),
            threshold: default_stake_threshold(),
        }
    }
}

/// Parameters of a sponsor-funded activity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SponsoredActivityConfig {
    /// Tokens the sponsor pays the winning user.
    pub reward: f64,

    /// Probability of winning the draw.
    pub win_probability: f64,

    /// Base participation threshold.
    pub threshold: f64,

    /// Periodic fee the sponsor pays the administrator.
    #[serde(default = "default_sponsor_fee")]
    pub fee: f64,
}

/// Parameters of every activity plus the shared cooldown model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivitiesConfig {
    /// Standard stake-and-win activity.
    #[serde(default)]
    pub standard: StakeActivityConfig,

    /// Burning activity.
    #[serde(default)]
    pub burning: StakeActivityConfig,

    /// Mining activity.
    #[serde(default)]
    pub mining: StakeActivityConfig,

    /// Brand-hosted activity.
    #[serde(default = "default_host")]
    pub host: SponsoredActivityConfig,

    /// Data-partner pool activity.
    #[serde(default = "default_data_pool")]
    pub data_pool: SponsoredActivityConfig,

    /// Multiplier on the dynamic threshold for hosted activities.
    #[serde(default = "default_host_threshold_multiplier")]
    pub host_threshold_multiplier: f64,

    /// Share of a forfeited standard stake kept by the administrator; the
    /// rest is burned.
    #[serde(default = "default_house_share")]
    pub house_share: f64,

    /// Share of every sponsor fee that is burned.
    #[serde(default = "default_fee_burn_share")]
    pub fee_burn_share: f64,

    /// Ticks between sponsor fee payments.
    #[serde(default = "default_sponsor_fee_period_ticks")]
    pub sponsor_fee_period_ticks: u64,

    /// Cooldown lengths (ticks) a participant may draw.
    #[serde(default = "default_cooldown_options")]
    pub cooldown_options: Vec<u32>,

    /// Relative weights of `cooldown_options`.
    #[serde(default = "default_cooldown_weights")]
    pub cooldown_weights: Vec<u32>,
}

impl Default for ActivitiesConfig {
    fn default() -> Self {
        Self {
            standard: StakeActivityConfig::default(),
            burning: StakeActivityConfig::default(),
            mining: StakeActivityConfig::default(),
            host: default_host(),
            data_pool: default_data_pool(),
            host_threshold_multiplier: default_host_threshold_multiplier(),
            house_share: default_house_share(),
            fee_burn_share: default_fee_burn_share(),
            sponsor_fee_period_ticks: default_sponsor_fee_period_ticks(),
            cooldown_options: default_cooldown_options(),
            cooldown_weights: default_cooldown_weights(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_initial_users() -> usize {
    1000
}

const fn default_initial_speculators() -> usize {
    1000
}

const fn default_growth_rate() -> f64 {
    0.01
}

const fn default_max_agents() -> usize {
    20_000
}

const fn default_user_cash() -> f64 {
    1000.0
}

const fn default_speculator_cash() -> f64 {
    3000.0
}

const fn default_sponsor_cash() -> f64 {
    10_000.0
}

const fn default_user_random_factor() -> UniformRange {
    UniformRange { min: 1.0, max: 3.0 }
}

const fn default_speculator_random_factor() -> UniformRange {
    UniformRange { min: 1.0, max: 5.0 }
}

const fn default_data_utility() -> f64 {
    75.0
}

const fn default_threshold_mean() -> f64 {
    5.0
}

const fn default_threshold_std_dev() -> f64 {
    1.0
}

const fn default_max_trade_cash() -> f64 {
    1000.0
}

const fn default_max_fraction() -> f64 {
    0.5
}

const fn default_stake() -> f64 {
    1000.0
}

const fn default_standard_reward() -> f64 {
    1500.0
}

const fn default_stake_win_probability() -> f64 {
    0.9
}

const fn default_stake_threshold() -> f64 {
    5.0
}

const fn default_sponsor_fee() -> f64 {
    10_000.0
}

const fn default_host() -> SponsoredActivityConfig {
    SponsoredActivityConfig {
        reward: 2000.0,
        win_probability: 0.8,
        threshold: 10.0,
        fee: default_sponsor_fee(),
    }
}

const fn default_data_pool() -> SponsoredActivityConfig {
    SponsoredActivityConfig {
        reward: 5000.0,
        win_probability: 1.0,
        threshold: 50.0,
        fee: default_sponsor_fee(),
    }
}

const fn default_host_threshold_multiplier() -> f64 {
    5.0
}

const fn default_house_share() -> f64 {
    0.9
}

const fn default_fee_burn_share() -> f64 {
    0.1
}

const fn default_sponsor_fee_period_ticks() -> u64 {
    30
}

fn default_cooldown_options() -> Vec<u32> {
    vec![7, 14, 21, 28]
}

fn default_cooldown_weights() -> Vec<u32> {
    vec![4, 3, 2, 1]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_economy() {
        let population = PopulationConfig::default();
        assert_eq!(population.initial_users, 1000);
        assert!((population.speculator_cash - 3000.0).abs() < f64::EPSILON);
        assert_eq!(population.growth_cadence, GrowthCadence::Daily);

        let activities = ActivitiesConfig::default();
        assert!((activities.standard.reward - 1500.0).abs() < f64::EPSILON);
        assert!((activities.data_pool.win_probability - 1.0).abs() < f64::EPSILON);
        assert_eq!(activities.cooldown_options, vec![7, 14, 21, 28]);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "initial_users: 10\ngrowth_cadence: monthly\n";
        let population: PopulationConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(population.initial_users, 10);
        assert_eq!(population.growth_cadence, GrowthCadence::Monthly);
        assert!((population.user_cash - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uniform_range_validity() {
        assert!(UniformRange { min: 1.0, max: 1.0 }.is_valid());
        assert!(!UniformRange { min: 2.0, max: 1.0 }.is_valid());
        assert!(!UniformRange { min: f64::NAN, max: 1.0 }.is_valid());
    }
}
