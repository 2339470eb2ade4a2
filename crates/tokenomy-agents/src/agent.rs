//! Agents, the administrator, and the population roster.
//!
//! Every trading participant is an [`Agent`] carrying cash, tokens, and a
//! closed [`AgentKind`] variant with its own parameters. Agents are created
//! at initialization or by the growth model and are never removed.
//!
//! Agent IDs and random coefficients are drawn from the run's seeded
//! generator, so two runs with the same seed build identical rosters.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use tokenomy_ledger::{Token, TokenError};
use tokenomy_types::{AgentClass, AgentId};

use crate::config::{PopulationConfig, UniformRange};
use crate::error::PopulationError;

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Parameters of a regular user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularParams {
    /// Multiplier on the activity utility.
    pub random_factor: f64,
    /// Fixed utility compared against the data-pool threshold.
    pub data_utility: f64,
    /// Ticks until the user may take part in another activity.
    pub cooldown: u32,
}

/// Parameters of a speculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeculatorParams {
    /// Multiplier on the buy and sell utilities.
    pub random_factor: f64,
    /// Buy utility needed before buying.
    pub buy_threshold: f64,
    /// Sell utility needed before selling.
    pub sell_threshold: f64,
}

/// Parameters of a brand or data partner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SponsorParams {
    /// First tick at which the next periodic fee is due.
    pub next_fee_tick: u64,
    /// Cumulative fees paid to the administrator.
    pub fees_paid: f64,
}

/// The class-specific part of an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentKind {
    /// Regular user taking part in activities.
    Regular(RegularParams),
    /// Speculator trading on utility divergence.
    Speculator(SpeculatorParams),
    /// Brand hosting sponsored activities.
    Brand(SponsorParams),
    /// Data partner funding data-pool activities.
    DataPartner(SponsorParams),
}

/// A trading participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Cash balance, never negative.
    pub cash: f64,
    /// Token balance, never negative.
    pub tokens: f64,
    /// Class-specific parameters.
    pub kind: AgentKind,
}

impl Agent {
    /// Create an agent with no tokens.
    pub const fn new(id: AgentId, cash: f64, kind: AgentKind) -> Self {
        Self {
            id,
            cash,
            tokens: 0.0,
            kind,
        }
    }

    /// The agent's class.
    pub const fn class(&self) -> AgentClass {
        match self.kind {
            AgentKind::Regular(_) => AgentClass::Regular,
            AgentKind::Speculator(_) => AgentClass::Speculator,
            AgentKind::Brand(_) => AgentClass::Brand,
            AgentKind::DataPartner(_) => AgentClass::DataPartner,
        }
    }

    /// Sponsor parameters, for brands and data partners.
    pub const fn sponsor_mut(&mut self) -> Option<&mut SponsorParams> {
        match &mut self.kind {
            AgentKind::Brand(params) | AgentKind::DataPartner(params) => Some(params),
            AgentKind::Regular(_) | AgentKind::Speculator(_) => None,
        }
    }

    /// Remove up to `amount` tokens and return how many were removed.
    pub fn debit_tokens(&mut self, amount: f64) -> f64 {
        let taken = amount.min(self.tokens).max(0.0);
        self.tokens -= taken;
        taken
    }
}

// ---------------------------------------------------------------------------
// Administrator
// ---------------------------------------------------------------------------

/// The token operator: receives fees and forfeited stakes, performs burns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Administrator {
    /// Tokens held.
    pub tokens: f64,
    /// Cash held.
    pub cash: f64,
    /// Cumulative gross fees received.
    pub fees_received: f64,
    /// Cumulative tokens this account burned.
    pub burned: f64,
}

impl Administrator {
    /// Create an empty administrator account.
    pub const fn new() -> Self {
        Self {
            tokens: 0.0,
            cash: 0.0,
            fees_received: 0.0,
            burned: 0.0,
        }
    }

    /// Accept `amount` tokens, keeping `1 - burn_share` and burning the rest.
    ///
    /// Returns the amount burned. Nothing changes if the burn fails.
    ///
    /// # Errors
    ///
    /// Propagates [`TokenError`] from the burn.
    pub fn receive_with_burn(
        &mut self,
        token: &mut Token,
        amount: f64,
        burn_share: f64,
    ) -> Result<f64, TokenError> {
        let burned = amount * burn_share;
        if burned > 0.0 {
            token.burn(burned)?;
            self.burned += burned;
        }
        self.tokens += amount - burned;
        Ok(burned)
    }

    /// Accept a sponsor fee: the fee counts toward `fees_received`.
    ///
    /// # Errors
    ///
    /// Propagates [`TokenError`] from the burn.
    pub fn receive_fee(
        &mut self,
        token: &mut Token,
        amount: f64,
        burn_share: f64,
    ) -> Result<f64, TokenError> {
        let burned = self.receive_with_burn(token, amount, burn_share)?;
        self.fees_received += amount;
        Ok(burned)
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Every agent in a run, grouped by class.
///
/// Brand and data partner are separate fields so a user and its sponsor can
/// be borrowed mutably at the same time.
#[derive(Debug, Clone)]
pub struct Population {
    /// Regular users, in creation order.
    pub users: Vec<Agent>,
    /// Speculators, in creation order.
    pub speculators: Vec<Agent>,
    /// The brand hosting sponsored activities.
    pub brand: Agent,
    /// The data partner funding data-pool activities.
    pub data_partner: Agent,
    factory: AgentFactory,
}

impl Population {
    /// Build the initial roster.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::InvalidParameter`] if a cash balance is
    /// negative, a random-factor range is invalid, or the threshold
    /// distribution cannot be built.
    pub fn new<R: Rng + ?Sized>(
        config: &PopulationConfig,
        rng: &mut R,
    ) -> Result<Self, PopulationError> {
        let factory = AgentFactory::new(config)?;
        let users = (0..config.initial_users.min(config.max_users))
            .map(|_| factory.user(rng))
            .collect();
        let speculators = (0..config.initial_speculators.min(config.max_speculators))
            .map(|_| factory.speculator(rng))
            .collect();
        let brand = Agent::new(
            random_id(rng),
            config.brand_cash,
            AgentKind::Brand(SponsorParams::default()),
        );
        let data_partner = Agent::new(
            random_id(rng),
            config.data_partner_cash,
            AgentKind::DataPartner(SponsorParams::default()),
        );
        Ok(Self {
            users,
            speculators,
            brand,
            data_partner,
            factory,
        })
    }

    /// Add `count` regular users.
    pub fn add_users<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        self.users.reserve(count);
        for _ in 0..count {
            self.users.push(self.factory.user(rng));
        }
    }

    /// Add `count` speculators.
    pub fn add_speculators<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        self.speculators.reserve(count);
        for _ in 0..count {
            self.speculators.push(self.factory.speculator(rng));
        }
    }

    /// Iterate over every agent.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.users
            .iter()
            .chain(self.speculators.iter())
            .chain([&self.brand, &self.data_partner])
    }

    /// Sum of every agent's tokens.
    pub fn total_tokens(&self) -> f64 {
        self.iter().map(|a| a.tokens).sum()
    }

    /// Sum of every agent's cash.
    pub fn total_cash(&self) -> f64 {
        self.iter().map(|a| a.cash).sum()
    }

    /// Whether every agent's balances are non-negative and finite.
    pub fn balances_valid(&self) -> bool {
        self.iter().all(|a| {
            a.cash >= 0.0 && a.tokens >= 0.0 && a.cash.is_finite() && a.tokens.is_finite()
        })
    }
}

/// Number of agents to add so `current` grows by `rate`, capped at `cap`.
///
/// Computed as `floor(current * (1 + rate)) - current`, so small rosters
/// may not grow at all.
pub fn growth_increment(current: usize, rate: f64, cap: usize) -> usize {
    if !(rate.is_finite() && rate > 0.0) || current >= cap {
        return 0;
    }
    let target = (current as f64 * (1.0 + rate)).floor();
    let cap_f = cap as f64;
    let clamped = if target > cap_f { cap_f } else { target };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let target = clamped.max(0.0) as usize;
    target.saturating_sub(current)
}

/// Draws new agents with the configured coefficients.
#[derive(Debug, Clone)]
struct AgentFactory {
    user_cash: f64,
    speculator_cash: f64,
    data_utility: f64,
    user_random_factor: UniformRange,
    speculator_random_factor: UniformRange,
    thresholds: Normal<f64>,
}

impl AgentFactory {
    fn new(config: &PopulationConfig) -> Result<Self, PopulationError> {
        let cash = [
            config.user_cash,
            config.speculator_cash,
            config.brand_cash,
            config.data_partner_cash,
        ];
        if cash.iter().any(|c| !(c.is_finite() && *c >= 0.0)) {
            return Err(PopulationError::InvalidParameter(
                "starting cash must be non-negative",
            ));
        }
        if !config.user_random_factor.is_valid() || !config.speculator_random_factor.is_valid() {
            return Err(PopulationError::InvalidParameter(
                "random factor range must be finite with min <= max",
            ));
        }
        let thresholds = Normal::new(config.threshold_mean, config.threshold_std_dev)
            .ok()
            .ok_or(PopulationError::InvalidParameter(
                "threshold distribution needs a finite mean and non-negative deviation",
            ))?;
        Ok(Self {
            user_cash: config.user_cash,
            speculator_cash: config.speculator_cash,
            data_utility: config.data_utility,
            user_random_factor: config.user_random_factor,
            speculator_random_factor: config.speculator_random_factor,
            thresholds,
        })
    }

    fn user<R: Rng + ?Sized>(&self, rng: &mut R) -> Agent {
        let id = random_id(rng);
        Agent::new(
            id,
            self.user_cash,
            AgentKind::Regular(RegularParams {
                random_factor: sample_range(self.user_random_factor, rng),
                data_utility: self.data_utility,
                cooldown: 0,
            }),
        )
    }

    fn speculator<R: Rng + ?Sized>(&self, rng: &mut R) -> Agent {
        let id = random_id(rng);
        Agent::new(
            id,
            self.speculator_cash,
            AgentKind::Speculator(SpeculatorParams {
                random_factor: sample_range(self.speculator_random_factor, rng),
                buy_threshold: self.thresholds.sample(rng),
                sell_threshold: self.thresholds.sample(rng),
            }),
        )
    }
}

fn random_id<R: Rng + ?Sized>(rng: &mut R) -> AgentId {
    AgentId::from_random_bytes(rng.random())
}

fn sample_range<R: Rng + ?Sized>(range: UniformRange, rng: &mut R) -> f64 {
    if range.max > range.min {
        rng.random_range(range.min..=range.max)
    } else {
        range.min
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn initial_roster_matches_config() {
        let config = PopulationConfig {
            initial_users: 5,
            initial_speculators: 3,
            ..PopulationConfig::default()
        };
        let population = Population::new(&config, &mut rng()).unwrap();
        assert_eq!(population.users.len(), 5);
        assert_eq!(population.speculators.len(), 3);
        assert_eq!(population.brand.class(), AgentClass::Brand);
        assert!(population.total_tokens().abs() < f64::EPSILON);
        assert!(population.balances_valid());
    }

    #[test]
    fn random_factors_within_configured_range() {
        let population = Population::new(&PopulationConfig::default(), &mut rng()).unwrap();
        for user in &population.users {
            if let AgentKind::Regular(params) = user.kind {
                assert!((1.0..=3.0).contains(&params.random_factor));
                assert_eq!(params.cooldown, 0);
            }
        }
        for spec in &population.speculators {
            if let AgentKind::Speculator(params) = spec.kind {
                assert!((1.0..=5.0).contains(&params.random_factor));
            }
        }
    }

    #[test]
    fn same_seed_builds_same_roster() {
        let config = PopulationConfig {
            initial_users: 20,
            initial_speculators: 20,
            ..PopulationConfig::default()
        };
        let a = Population::new(&config, &mut rng()).unwrap();
        let b = Population::new(&config, &mut rng()).unwrap();
        assert_eq!(a.users, b.users);
        assert_eq!(a.speculators, b.speculators);
    }

    #[test]
    fn growth_increment_floors_and_caps() {
        assert_eq!(growth_increment(1000, 0.01, 20_000), 10);
        assert_eq!(growth_increment(50, 0.01, 20_000), 0);
        assert_eq!(growth_increment(1000, 0.5, 1200), 200);
        assert_eq!(growth_increment(1200, 0.5, 1200), 0);
        assert_eq!(growth_increment(1000, 0.0, 20_000), 0);
        assert_eq!(growth_increment(1000, f64::NAN, 20_000), 0);
    }

    #[test]
    fn add_users_extends_roster() {
        let config = PopulationConfig {
            initial_users: 2,
            ..PopulationConfig::default()
        };
        let mut r = rng();
        let mut population = Population::new(&config, &mut r).unwrap();
        population.add_users(3, &mut r);
        assert_eq!(population.users.len(), 5);
    }

    #[test]
    fn negative_cash_rejected() {
        let config = PopulationConfig {
            user_cash: -1.0,
            ..PopulationConfig::default()
        };
        assert!(Population::new(&config, &mut rng()).is_err());
    }

    #[test]
    fn administrator_fee_burns_share() {
        let mut token = Token::new(1_000_000.0, 0.01, 0.5).unwrap();
        token.release(10_000.0).unwrap();
        let mut admin = Administrator::new();
        let burned = admin.receive_fee(&mut token, 10_000.0, 0.1).unwrap();
        assert!((burned - 1_000.0).abs() < 1e-9);
        assert!((admin.tokens - 9_000.0).abs() < 1e-9);
        assert!((admin.fees_received - 10_000.0).abs() < 1e-9);
        assert!((token.circulating_supply() - 9_000.0).abs() < 1e-9);
    }

    #[test]
    fn debit_tokens_never_goes_negative() {
        let mut agent = Agent::new(
            AgentId::from_random_bytes([1; 16]),
            0.0,
            AgentKind::Brand(SponsorParams::default()),
        );
        agent.tokens = 5.0;
        assert!((agent.debit_tokens(8.0) - 5.0).abs() < f64::EPSILON);
        assert!(agent.tokens.abs() < f64::EPSILON);
    }
}
