//! Tick cycle: the fixed sequence of phases that advances the economy by
//! one day.
//!
//! Each tick runs these phases, in order:
//!
//! 1. **Vesting** -- every pool runs its release schedule for the tick.
//! 2. **Injection** -- pools place their per-tick share of vested tokens on
//!    the exchange.
//! 3. **Growth** -- the user and speculator rosters grow by their configured
//!    rate (every tick, or on month boundaries only).
//! 4. **Activities** -- every regular user, in roster order, attempts one
//!    randomly chosen activity.
//! 5. **Trading** -- every speculator, in roster order, places at most one
//!    trade.
//! 6. **Pricing** -- the exchange forms the new price from the tick's demand
//!    and supply.
//! 7. **Verification** -- supply, holdings, and allocation conservation
//!    checks; a mismatch is logged and counted, never fatal.
//!
//! Agents later in a phase observe the balances and market inventory left by
//! earlier agents in the same phase. The cycle is deterministic given the
//! configuration and seed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use tokenomy_agents::exchange::rejection_event;
use tokenomy_agents::{
    ActivityEngine, ActivityError, Administrator, Exchange, GrowthCadence, MarketContext,
    Population, PopulationConfig, PopulationError, TradingConfig, activity_utility, decide_trade,
    growth_increment, speculator_utilities,
};
use tokenomy_ledger::conservation::{verify_allocation, verify_holdings, verify_supply};
use tokenomy_ledger::{ConservationResult, PoolSet, PriceUpdate, Token, TokenError, VestingError};
use tokenomy_types::{
    ActivityKind, ActivityOutcome, AgentClass, AgentId, SimEvent, TickSnapshot, TradeSide,
};

use crate::clock::{ClockError, SimulationClock};
use crate::config::SimulationConfig;

/// Errors that can occur while building state or executing a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The token could not be created.
    #[error("token error: {source}")]
    Token {
        /// The underlying token error.
        #[from]
        source: TokenError,
    },

    /// The pool roster could not be built.
    #[error("pool error: {source}")]
    Vesting {
        /// The underlying pool error.
        #[from]
        source: VestingError,
    },

    /// The initial population could not be built.
    #[error("population error: {source}")]
    Population {
        /// The underlying population error.
        #[from]
        source: PopulationError,
    },

    /// An activity broke a ledger invariant.
    #[error("activity error for {agent_id}: {source}")]
    Activity {
        /// The user whose activity failed.
        agent_id: AgentId,
        /// The underlying activity error.
        source: ActivityError,
    },

    /// The activity configuration is invalid.
    #[error("activity configuration error: {source}")]
    ActivityConfig {
        /// The underlying activity error.
        source: ActivityError,
    },
}

/// Outcome counts for one tick's activity phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityTally {
    /// Users that reached the draw.
    pub participated: u64,
    /// Users that won.
    pub won: u64,
    /// Users skipped while cooling down.
    pub on_cooldown: u64,
    /// Attempts that failed a utility threshold.
    pub below_threshold: u64,
    /// Attempts that failed for lack of stake, sponsor tokens, or supply.
    pub unfunded: u64,
}

impl ActivityTally {
    fn count(&mut self, outcome: &ActivityOutcome) {
        let slot = match outcome {
            ActivityOutcome::Won { .. } => {
                self.won = self.won.saturating_add(1);
                &mut self.participated
            }
            ActivityOutcome::Lost { .. } => &mut self.participated,
            ActivityOutcome::OnCooldown { .. } => &mut self.on_cooldown,
            ActivityOutcome::BelowThreshold { .. } => &mut self.below_threshold,
            ActivityOutcome::InsufficientStake { .. }
            | ActivityOutcome::SponsorUnfunded { .. }
            | ActivityOutcome::RewardUnfunded { .. } => &mut self.unfunded,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Trade counts for one tick's trading phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeTally {
    /// Executed buys.
    pub buys: u64,
    /// Executed sells.
    pub sells: u64,
    /// Rejected trades.
    pub rejected: u64,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// End-of-tick reporting snapshot.
    pub snapshot: TickSnapshot,
    /// This tick's price formation.
    pub price_update: PriceUpdate,
    /// Regular users added by growth.
    pub users_added: u64,
    /// Speculators added by growth.
    pub speculators_added: u64,
    /// Activity outcome counts.
    pub activities: ActivityTally,
    /// Speculator trade counts.
    pub trades: TradeTally,
    /// Whether every conservation check passed.
    pub balanced: bool,
    /// Structured events, empty unless event recording is enabled.
    pub events: Vec<SimEvent>,
}

/// The mutable simulation state passed through the tick cycle.
///
/// One run owns exactly one state; nothing in it is shared with other runs.
#[derive(Debug)]
pub struct SimulationState {
    /// The simulation clock.
    pub clock: SimulationClock,
    /// The token ledger.
    pub token: Token,
    /// The pool roster.
    pub pools: PoolSet,
    /// The exchange.
    pub exchange: Exchange,
    /// The house account.
    pub administrator: Administrator,
    /// Every agent.
    pub population: Population,
    /// Activity rules.
    pub activities: ActivityEngine,
    /// Speculator trade caps.
    pub trading: TradingConfig,
    /// Growth parameters.
    pub growth: PopulationConfig,
    /// Whether tick summaries carry events.
    pub record_events: bool,
    /// Ticks with at least one failed conservation check.
    pub conservation_anomalies: u64,
    /// Seed the random stream was built from.
    seed: u64,
    /// The run's random stream.
    rng: ChaCha8Rng,
}

impl SimulationState {
    /// Build tick-0 state from `config`, seeded with `simulation.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if the clock, token, pools, population, or
    /// activity rules cannot be built from the configuration.
    pub fn new(config: &SimulationConfig) -> Result<Self, TickError> {
        Self::with_seed(config, config.simulation.seed)
    }

    /// Build tick-0 state from `config` with an explicit seed.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if the clock, token, pools, population, or
    /// activity rules cannot be built from the configuration.
    pub fn with_seed(config: &SimulationConfig, seed: u64) -> Result<Self, TickError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let clock = SimulationClock::new(&config.simulation)?;
        let token = Token::new(
            config.token.total_supply,
            config.token.initial_price,
            config.token.elasticity,
        )?;
        let pools = PoolSet::from_specs(
            &config.pools,
            config.token.total_supply,
            clock.ticks_per_month(),
            &mut rng,
        )?;
        let population = Population::new(&config.population, &mut rng)?;
        let activities = ActivityEngine::new(&config.activities)
            .map_err(|source| TickError::ActivityConfig { source })?;

        Ok(Self {
            clock,
            token,
            pools,
            exchange: Exchange::new(),
            administrator: Administrator::new(),
            population,
            activities,
            trading: config.trading.clone(),
            growth: config.population.clone(),
            record_events: config.simulation.record_events,
            conservation_anomalies: 0,
            seed,
            rng,
        })
    }

    /// Seed the random stream was built from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Sum of every token outside the pools' unreleased buckets.
    pub fn holdings(&self) -> f64 {
        self.population.total_tokens()
            + self.administrator.tokens
            + self.exchange.available()
            + self.pools.total_recycled()
    }

    /// Reporting snapshot of the current state.
    pub fn snapshot(&self) -> TickSnapshot {
        let price = self.token.price();
        let depth = self.exchange.tokens_on_market();
        let (buy, sell): (Vec<f64>, Vec<f64>) = self
            .population
            .speculators
            .iter()
            .filter_map(|s| speculator_utilities(s, price))
            .unzip();

        TickSnapshot {
            tick: self.clock.tick(),
            price,
            circulating_supply: self.token.circulating_supply(),
            exchange_available: self.exchange.available(),
            tokens_on_market: depth,
            pools: self.pools.iter().map(|p| (p.role(), p.snapshot())).collect(),
            mean_user_utility: mean(
                self.population
                    .users
                    .iter()
                    .filter_map(|u| activity_utility(u, price)),
            ),
            mean_speculator_buy_utility: mean(buy.into_iter()),
            mean_speculator_sell_utility: mean(sell.into_iter()),
            activity_thresholds: ActivityKind::ALL
                .iter()
                .map(|kind| (*kind, self.activities.threshold(*kind, depth)))
                .collect(),
            users: count(self.population.users.len()),
            speculators: count(self.population.speculators.len()),
        }
    }
}

/// Collects events only when recording is enabled.
struct EventLog {
    enabled: bool,
    events: Vec<SimEvent>,
}

impl EventLog {
    const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    fn push(&mut self, event: SimEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    fn extend(&mut self, events: impl IntoIterator<Item = SimEvent>) {
        if self.enabled {
            self.events.extend(events);
        }
    }
}

/// Execute one complete tick and advance the clock.
///
/// # Errors
///
/// Returns [`TickError::Activity`] if an activity breaks a ledger invariant,
/// or [`TickError::Clock`] if the tick counter overflows. Per-agent trade
/// and activity failures are recorded in the summary, never returned.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    let tick = state.clock.tick();
    state.token.set_tick(tick);
    let mut log = EventLog::new(state.record_events);

    // --- Phase 1: Vesting ---
    for (pool, release) in state.pools.vest_all(tick) {
        if release.amount > 0.0 {
            log.push(SimEvent::VestingReleased {
                tick,
                pool,
                amount: release.amount,
                cumulative: release.cumulative,
            });
        }
    }

    // --- Phase 2: Injection ---
    log.extend(
        state
            .exchange
            .inject_supply(&mut state.token, &mut state.pools),
    );

    // --- Phase 3: Growth ---
    let (users_added, speculators_added) = grow_population(state, &mut log);

    // --- Phase 4: Activities ---
    let activities = run_activities(state, &mut log)?;

    // --- Phase 5: Trading ---
    let trades = run_speculators(state, &mut log);

    // --- Phase 6: Pricing ---
    let demand = state.exchange.demand();
    let supply = state.exchange.supply();
    let price_update = state.exchange.update_market_price(&mut state.token);
    log.push(SimEvent::PriceUpdated {
        previous: price_update.previous,
        price: price_update.price,
        demand,
        supply,
    });

    // --- Phase 7: Verification ---
    let balanced = verify(state, &mut log);

    let snapshot = state.snapshot();
    info!(
        tick,
        price = snapshot.price,
        circulating = snapshot.circulating_supply,
        available = snapshot.exchange_available,
        users = snapshot.users,
        speculators = snapshot.speculators,
        participated = activities.participated,
        buys = trades.buys,
        sells = trades.sells,
        "tick complete"
    );

    state.clock.advance()?;

    Ok(TickSummary {
        tick,
        snapshot,
        price_update,
        users_added,
        speculators_added,
        activities,
        trades,
        balanced,
        events: log.events,
    })
}

fn grow_population(state: &mut SimulationState, log: &mut EventLog) -> (u64, u64) {
    let growth = &state.growth;
    let due = match growth.growth_cadence {
        GrowthCadence::Daily => true,
        GrowthCadence::Monthly => state.clock.is_month_boundary(),
    };
    if !due {
        return (0, 0);
    }

    let population = &mut state.population;
    let users = growth_increment(
        population.users.len(),
        growth.user_growth_rate,
        growth.max_users,
    );
    let speculators = growth_increment(
        population.speculators.len(),
        growth.speculator_growth_rate,
        growth.max_speculators,
    );
    population.add_users(users, &mut state.rng);
    population.add_speculators(speculators, &mut state.rng);

    for (class, added, total) in [
        (AgentClass::Regular, users, population.users.len()),
        (AgentClass::Speculator, speculators, population.speculators.len()),
    ] {
        if added > 0 {
            debug!(class = class.as_str(), added, total, "population grew");
            log.push(SimEvent::PopulationGrew {
                class,
                added: count(added),
                total: count(total),
            });
        }
    }
    (count(users), count(speculators))
}

fn run_activities(
    state: &mut SimulationState,
    log: &mut EventLog,
) -> Result<ActivityTally, TickError> {
    let SimulationState {
        token,
        pools,
        exchange,
        administrator,
        population,
        activities,
        rng,
        ..
    } = state;
    let Population {
        users,
        brand,
        data_partner,
        ..
    } = population;
    let mut market = MarketContext {
        token,
        pools,
        exchange,
        administrator,
    };

    let mut tally = ActivityTally::default();
    for user in users {
        let kind = ActivityEngine::choose(rng);
        let sponsor = match kind {
            ActivityKind::Host => Some(&mut *brand),
            ActivityKind::DataPool => Some(&mut *data_partner),
            ActivityKind::Standard | ActivityKind::Burning | ActivityKind::Mining => None,
        };
        let report = activities
            .run(kind, user, sponsor, &mut market, rng)
            .map_err(|source| TickError::Activity {
                agent_id: user.id,
                source,
            })?;
        tally.count(&report.outcome);
        log.extend(report.events);
    }
    Ok(tally)
}

fn run_speculators(state: &mut SimulationState, log: &mut EventLog) -> TradeTally {
    let SimulationState {
        token,
        pools,
        exchange,
        population,
        trading,
        ..
    } = state;

    let mut tally = TradeTally::default();
    for speculator in &mut population.speculators {
        let Some(intent) = decide_trade(speculator, token.price(), trading) else {
            continue;
        };
        let result = match intent.side {
            TradeSide::Buy => exchange.buy(token, pools, speculator, intent.amount),
            TradeSide::Sell => exchange.sell(token, speculator, intent.amount),
        };
        match result {
            Ok(receipt) => {
                let slot = match intent.side {
                    TradeSide::Buy => &mut tally.buys,
                    TradeSide::Sell => &mut tally.sells,
                };
                *slot = slot.saturating_add(1);
                log.extend(receipt.events(speculator));
            }
            Err(err) => {
                tally.rejected = tally.rejected.saturating_add(1);
                debug!(
                    agent = %speculator.id,
                    side = ?intent.side,
                    amount = intent.amount,
                    error = %err,
                    "trade rejected"
                );
                log.push(rejection_event(
                    Some(speculator.id),
                    intent.side,
                    intent.amount,
                    &err,
                ));
            }
        }
    }
    tally
}

/// Run every conservation check; returns whether all passed.
fn verify(state: &mut SimulationState, log: &mut EventLog) -> bool {
    let tick = state.clock.tick();
    let holdings = state.holdings();
    let circulating = state.token.circulating_supply();
    let checks = [
        verify_supply(&state.token),
        verify_holdings(tick, holdings, circulating),
        verify_allocation(tick, &state.pools, state.token.total_supply()),
    ];

    let mut balanced = true;
    for check in checks {
        if let ConservationResult::Anomaly(anomaly) = check {
            warn!(
                tick,
                expected = anomaly.expected,
                actual = anomaly.actual,
                "{anomaly}"
            );
            balanced = false;
        }
    }
    if !balanced {
        state.conservation_anomalies = state.conservation_anomalies.saturating_add(1);
        log.push(SimEvent::ConservationAnomaly {
            holdings,
            circulating,
        });
    }
    balanced
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0_usize), |(sum, n), v| (sum + v, n.saturating_add(1)));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokenomy_types::PoolRole;

    use super::*;

    fn small_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.population.initial_users = 50;
        config.population.initial_speculators = 50;
        config.simulation.record_events = true;
        config
    }

    #[test]
    fn tick_zero_releases_tge() {
        let config = small_config();
        let mut state = SimulationState::new(&config).unwrap();
        let summary = run_tick(&mut state).unwrap();

        assert_eq!(summary.tick, 0);
        assert_eq!(state.clock.tick(), 1);
        let supply = config.token.total_supply;
        let liquidity = state.pools.get(PoolRole::Liquidity).unwrap();
        assert!((liquidity.released() - 0.10 * supply).abs() < 1.0);
        let public_sale = state.pools.get(PoolRole::PublicSaleAirdrop).unwrap();
        assert!((public_sale.released() - 0.13 * 0.20 * supply).abs() < 1.0);
        assert!(summary.balanced);
        assert!(summary.events.iter().any(|e| matches!(e, SimEvent::VestingReleased { .. })));
        assert!(matches!(
            summary.events.last(),
            Some(SimEvent::PriceUpdated { .. })
        ));
    }

    #[test]
    fn tick_zero_grows_population() {
        let mut config = small_config();
        config.population.initial_users = 200;
        config.population.user_growth_rate = 0.01;
        let mut state = SimulationState::new(&config).unwrap();
        let summary = run_tick(&mut state).unwrap();
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.users_added, 2);
        assert_eq!(state.population.users.len(), 202);
        assert!(summary.events.iter().any(|e| matches!(
            e,
            SimEvent::PopulationGrew { added: 2, total: 202, .. }
        )));
    }

    #[test]
    fn daily_growth_floors() {
        let mut config = small_config();
        config.population.initial_users = 200;
        config.population.user_growth_rate = 0.01;
        let mut state = SimulationState::new(&config).unwrap();
        run_tick(&mut state).unwrap();
        assert_eq!(state.population.users.len(), 202);
        let summary = run_tick(&mut state).unwrap();
        assert_eq!(summary.users_added, 2);
        assert_eq!(state.population.users.len(), 204);
    }

    #[test]
    fn monthly_growth_waits_for_boundary() {
        let mut config = small_config();
        config.population.initial_users = 200;
        config.population.growth_cadence = GrowthCadence::Monthly;
        let mut state = SimulationState::new(&config).unwrap();
        let first = run_tick(&mut state).unwrap();
        assert_eq!(first.users_added, 2);
        for _ in 1..30 {
            let summary = run_tick(&mut state).unwrap();
            assert_eq!(summary.users_added, 0);
        }
        assert_eq!(state.population.users.len(), 202);
        let summary = run_tick(&mut state).unwrap();
        assert_eq!(summary.tick, 30);
        assert_eq!(summary.users_added, 2);
        assert_eq!(state.population.users.len(), 204);
    }

    #[test]
    fn every_tick_balances() {
        let mut state = SimulationState::new(&small_config()).unwrap();
        for _ in 0..60 {
            let summary = run_tick(&mut state).unwrap();
            assert!(summary.balanced, "tick {} unbalanced", summary.tick);
            assert!(summary.snapshot.price > 0.0);
            assert!(state.population.balances_valid());
            assert!(state.exchange.available() >= 0.0);
        }
        assert_eq!(state.conservation_anomalies, 0);
    }

    #[test]
    fn events_off_by_default() {
        let mut config = small_config();
        config.simulation.record_events = false;
        let mut state = SimulationState::new(&config).unwrap();
        let summary = run_tick(&mut state).unwrap();
        assert!(summary.events.is_empty());
    }

    #[test]
    fn snapshot_reports_every_pool_and_activity() {
        let mut state = SimulationState::new(&small_config()).unwrap();
        let summary = run_tick(&mut state).unwrap();
        assert_eq!(summary.snapshot.pools.len(), 6);
        assert_eq!(
            summary.snapshot.activity_thresholds.len(),
            ActivityKind::ALL.len()
        );
        assert!(summary.snapshot.mean_user_utility > 0.0);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert!(mean(std::iter::empty()).abs() < f64::EPSILON);
        assert!((mean([1.0, 2.0, 3.0].into_iter()) - 2.0).abs() < f64::EPSILON);
    }
}
