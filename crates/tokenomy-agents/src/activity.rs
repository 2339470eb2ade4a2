//! Stochastic activities that move tokens between users, sponsors, pools,
//! and the administrator.
//!
//! Every regular user attempts one activity per tick. An attempt passes
//! through a fixed sequence of gates, and the first gate that fails decides
//! the [`ActivityOutcome`]:
//!
//! 1. **Cooldown**: a user still cooling down is skipped and its counter
//!    decremented.
//! 2. **Sponsor fee** (hosted and data-pool activities): the sponsor pays its
//!    periodic fee to the administrator, buying tokens if short.
//! 3. **Threshold**: the user's utility must exceed
//!    `base + ln(1 + tokens_on_market / 100000)`.
//! 4. **Funding**: stake activities buy the user's stake shortfall; sponsored
//!    activities buy the sponsor's reward shortfall.
//! 5. **Draw**: a Bernoulli trial with the activity's win probability.
//!
//! Users who reach the draw get a new cooldown from a weighted choice over
//! the configured options.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use tracing::debug;

use tokenomy_ledger::conservation::approx_eq;
use tokenomy_ledger::{PoolSet, Token, TokenError};
use tokenomy_types::{ActivityKind, ActivityOutcome, BurnCause, PoolRole, SimEvent, TradeSide};

use crate::agent::{Administrator, Agent, AgentKind};
use crate::config::{ActivitiesConfig, SponsoredActivityConfig, StakeActivityConfig};
use crate::error::ActivityError;
use crate::exchange::{Exchange, rejection_event};
use crate::utility::activity_utility;

/// Market depth at which the dynamic threshold has grown by `ln 2`.
pub const MARKET_DEPTH_SCALE: f64 = 100_000.0;

/// The shared market state an activity may touch.
#[derive(Debug)]
pub struct MarketContext<'a> {
    /// The token ledger.
    pub token: &'a mut Token,
    /// The pool roster.
    pub pools: &'a mut PoolSet,
    /// The exchange.
    pub exchange: &'a mut Exchange,
    /// The house account.
    pub administrator: &'a mut Administrator,
}

/// The result of one activity attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityReport {
    /// Activity attempted.
    pub kind: ActivityKind,
    /// How the attempt ended.
    pub outcome: ActivityOutcome,
    /// Every event the attempt produced, ending with `ActivityResolved`.
    pub events: Vec<SimEvent>,
}

/// Threshold a user's utility must exceed: `base + ln(1 + depth / 100000)`.
pub fn dynamic_threshold(base: f64, tokens_on_market: f64) -> f64 {
    base + (tokens_on_market.max(0.0) / MARKET_DEPTH_SCALE).ln_1p()
}

/// Runs activities with a validated configuration.
#[derive(Debug, Clone)]
pub struct ActivityEngine {
    config: ActivitiesConfig,
    cooldowns: WeightedIndex<u32>,
}

impl ActivityEngine {
    /// Validate `config` and build the cooldown distribution.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidCooldown`] if the cooldown options are
    /// empty, do not match their weights, or carry no weight, and
    /// [`ActivityError::InvalidParameter`] for an out-of-range probability,
    /// share, stake, reward, fee, or fee period.
    pub fn new(config: &ActivitiesConfig) -> Result<Self, ActivityError> {
        if config.cooldown_options.is_empty() {
            return Err(ActivityError::InvalidCooldown("no cooldown options"));
        }
        if config.cooldown_options.len() != config.cooldown_weights.len() {
            return Err(ActivityError::InvalidCooldown(
                "cooldown options and weights differ in length",
            ));
        }
        let cooldowns = WeightedIndex::new(config.cooldown_weights.iter().copied())
            .ok()
            .ok_or(ActivityError::InvalidCooldown(
                "cooldown weights must include a positive weight",
            ))?;

        let stakes = [&config.standard, &config.burning, &config.mining];
        let sponsored = [&config.host, &config.data_pool];
        let probabilities_valid = stakes
            .iter()
            .map(|c| c.win_probability)
            .chain(sponsored.iter().map(|c| c.win_probability))
            .all(is_unit);
        if !probabilities_valid {
            return Err(ActivityError::InvalidParameter(
                "win probabilities must lie in [0, 1]",
            ));
        }
        if !is_unit(config.house_share) || !is_unit(config.fee_burn_share) {
            return Err(ActivityError::InvalidParameter(
                "house and fee burn shares must lie in [0, 1]",
            ));
        }
        let amounts_valid = stakes
            .iter()
            .flat_map(|c| [c.stake, c.reward])
            .chain(sponsored.iter().flat_map(|c| [c.reward, c.fee]))
            .all(|a| a.is_finite() && a >= 0.0);
        if !amounts_valid {
            return Err(ActivityError::InvalidParameter(
                "stakes, rewards, and fees must be non-negative",
            ));
        }
        if config.standard.reward < config.standard.stake {
            return Err(ActivityError::InvalidParameter(
                "standard reward must cover the stake",
            ));
        }
        if config.sponsor_fee_period_ticks == 0 {
            return Err(ActivityError::InvalidParameter(
                "sponsor fee period must be at least one tick",
            ));
        }

        Ok(Self {
            config: config.clone(),
            cooldowns,
        })
    }

    /// The validated configuration.
    pub const fn config(&self) -> &ActivitiesConfig {
        &self.config
    }

    /// Pick one activity uniformly at random.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> ActivityKind {
        ActivityKind::ALL
            .choose(rng)
            .copied()
            .unwrap_or(ActivityKind::Standard)
    }

    /// The dynamic threshold for `kind` at the given market depth.
    pub fn threshold(&self, kind: ActivityKind, tokens_on_market: f64) -> f64 {
        let config = &self.config;
        match kind {
            ActivityKind::Standard => dynamic_threshold(config.standard.threshold, tokens_on_market),
            ActivityKind::Burning => dynamic_threshold(config.burning.threshold, tokens_on_market),
            ActivityKind::Mining => dynamic_threshold(config.mining.threshold, tokens_on_market),
            ActivityKind::Host => {
                config.host_threshold_multiplier
                    * dynamic_threshold(config.host.threshold, tokens_on_market)
            }
            ActivityKind::DataPool => dynamic_threshold(config.data_pool.threshold, tokens_on_market),
        }
    }

    /// Run one attempt of `kind` for `user`.
    ///
    /// Hosted activities need the brand as `sponsor`, data-pool activities
    /// the data partner. Exchange rejections along the way are reported as
    /// events, never as errors.
    ///
    /// # Errors
    ///
    /// - [`ActivityError::NotARegularUser`] if `user` is not a regular user.
    /// - [`ActivityError::MissingSponsor`] if a sponsored activity has no
    ///   sponsor, or the sponsor is not a brand or data partner.
    /// - [`ActivityError::MissingPool`] if the pool receiving a forfeited
    ///   stake is not on the roster.
    /// - [`ActivityError::Token`] for a burn the ledger refuses.
    pub fn run<R: Rng + ?Sized>(
        &self,
        kind: ActivityKind,
        user: &mut Agent,
        sponsor: Option<&mut Agent>,
        market: &mut MarketContext<'_>,
        rng: &mut R,
    ) -> Result<ActivityReport, ActivityError> {
        let AgentKind::Regular(params) = user.kind else {
            return Err(ActivityError::NotARegularUser);
        };

        let (outcome, mut events) = if params.cooldown > 0 {
            let remaining = params.cooldown.saturating_sub(1);
            set_cooldown(user, remaining);
            (ActivityOutcome::OnCooldown { remaining }, Vec::new())
        } else {
            match kind {
                ActivityKind::Standard => {
                    self.run_staked(kind, &self.config.standard, user, market, rng)?
                }
                ActivityKind::Burning => {
                    self.run_staked(kind, &self.config.burning, user, market, rng)?
                }
                ActivityKind::Mining => {
                    self.run_staked(kind, &self.config.mining, user, market, rng)?
                }
                ActivityKind::Host => {
                    let sponsor = sponsor.ok_or(ActivityError::MissingSponsor)?;
                    self.run_sponsored(kind, &self.config.host, user, sponsor, market, rng)?
                }
                ActivityKind::DataPool => {
                    let sponsor = sponsor.ok_or(ActivityError::MissingSponsor)?;
                    self.run_sponsored(kind, &self.config.data_pool, user, sponsor, market, rng)?
                }
            }
        };

        if outcome.participated() {
            let cooldown = self.draw_cooldown(rng);
            set_cooldown(user, cooldown);
        }

        debug!(
            tick = market.token.tick(),
            agent = %user.id,
            activity = kind.as_str(),
            outcome = ?outcome,
            "activity resolved"
        );
        events.push(SimEvent::ActivityResolved {
            agent: user.id,
            activity: kind,
            outcome: outcome.clone(),
        });
        Ok(ActivityReport {
            kind,
            outcome,
            events,
        })
    }

    fn run_staked<R: Rng + ?Sized>(
        &self,
        kind: ActivityKind,
        config: &StakeActivityConfig,
        user: &mut Agent,
        market: &mut MarketContext<'_>,
        rng: &mut R,
    ) -> Result<(ActivityOutcome, Vec<SimEvent>), ActivityError> {
        let mut events = Vec::new();
        let utility = activity_utility(user, market.token.price())
            .ok_or(ActivityError::NotARegularUser)?;
        let threshold = self.threshold(kind, market.exchange.tokens_on_market());
        if utility <= threshold {
            return Ok((ActivityOutcome::BelowThreshold { utility, threshold }, events));
        }

        buy_shortfall(market, user, config.stake, &mut events);
        if !covers(user.tokens, config.stake) {
            let outcome = ActivityOutcome::InsufficientStake {
                held: user.tokens,
                required: config.stake,
            };
            return Ok((outcome, events));
        }

        let stake = config.stake.min(user.tokens);
        let won = rng.random_bool(config.win_probability);
        let outcome = match (kind, won) {
            (ActivityKind::Standard, true) => {
                let net = config.reward - config.stake;
                if net > 0.0 {
                    match market.token.release(net) {
                        Ok(()) => user.tokens += net,
                        Err(TokenError::SupplyCapExceeded { .. }) => {
                            return Ok((ActivityOutcome::RewardUnfunded { requested: net }, events));
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                ActivityOutcome::Won { net_tokens: net }
            }
            (ActivityKind::Standard, false) => {
                let burned = market.administrator.receive_with_burn(
                    market.token,
                    stake,
                    1.0 - self.config.house_share,
                )?;
                user.debit_tokens(stake);
                push_burn(&mut events, burned, BurnCause::ForfeitedStake);
                ActivityOutcome::Lost { net_tokens: -stake }
            }
            (_, true) => {
                if stake > 0.0 {
                    market.token.burn(stake)?;
                }
                user.debit_tokens(stake);
                push_burn(&mut events, stake, BurnCause::ActivityWin);
                ActivityOutcome::Won { net_tokens: -stake }
            }
            (_, false) => {
                let role = if kind == ActivityKind::Mining {
                    PoolRole::Mining
                } else {
                    PoolRole::Ecosystem
                };
                market
                    .pools
                    .get_mut(role)
                    .ok_or(ActivityError::MissingPool(role))?
                    .recycle(stake)?;
                user.debit_tokens(stake);
                ActivityOutcome::Lost { net_tokens: -stake }
            }
        };
        Ok((outcome, events))
    }

    fn run_sponsored<R: Rng + ?Sized>(
        &self,
        kind: ActivityKind,
        config: &SponsoredActivityConfig,
        user: &mut Agent,
        sponsor: &mut Agent,
        market: &mut MarketContext<'_>,
        rng: &mut R,
    ) -> Result<(ActivityOutcome, Vec<SimEvent>), ActivityError> {
        let mut events = Vec::new();
        if let Some(outcome) = self.collect_fee(kind, config.fee, sponsor, market, &mut events)? {
            return Ok((outcome, events));
        }

        let AgentKind::Regular(params) = user.kind else {
            return Err(ActivityError::NotARegularUser);
        };
        let utility = if kind == ActivityKind::DataPool {
            params.data_utility
        } else {
            activity_utility(user, market.token.price()).ok_or(ActivityError::NotARegularUser)?
        };
        let threshold = self.threshold(kind, market.exchange.tokens_on_market());
        if utility <= threshold {
            return Ok((ActivityOutcome::BelowThreshold { utility, threshold }, events));
        }

        buy_shortfall(market, sponsor, config.reward, &mut events);
        if !covers(sponsor.tokens, config.reward) {
            let outcome = ActivityOutcome::SponsorUnfunded {
                held: sponsor.tokens,
                required: config.reward,
            };
            return Ok((outcome, events));
        }

        let outcome = if rng.random_bool(config.win_probability) {
            let paid = sponsor.debit_tokens(config.reward);
            user.tokens += paid;
            ActivityOutcome::Won { net_tokens: paid }
        } else {
            ActivityOutcome::Lost { net_tokens: 0.0 }
        };
        Ok((outcome, events))
    }

    /// Charge the sponsor's periodic fee if it is due.
    ///
    /// Returns an outcome only when the sponsor cannot pay.
    fn collect_fee(
        &self,
        kind: ActivityKind,
        fee: f64,
        sponsor: &mut Agent,
        market: &mut MarketContext<'_>,
        events: &mut Vec<SimEvent>,
    ) -> Result<Option<ActivityOutcome>, ActivityError> {
        let tick = market.token.tick();
        let due = sponsor
            .sponsor_mut()
            .ok_or(ActivityError::MissingSponsor)?
            .next_fee_tick;
        if tick < due {
            return Ok(None);
        }

        let mut burned = 0.0;
        if fee > 0.0 {
            buy_shortfall(market, sponsor, fee, events);
            if !covers(sponsor.tokens, fee) {
                return Ok(Some(ActivityOutcome::SponsorUnfunded {
                    held: sponsor.tokens,
                    required: fee,
                }));
            }
            let paid = fee.min(sponsor.tokens);
            burned = market.administrator.receive_fee(
                market.token,
                paid,
                self.config.fee_burn_share,
            )?;
            sponsor.debit_tokens(paid);
        }

        if let Some(params) = sponsor.sponsor_mut() {
            params.next_fee_tick = tick.saturating_add(self.config.sponsor_fee_period_ticks);
            params.fees_paid += fee;
        }
        debug!(tick, sponsor = %sponsor.id, activity = kind.as_str(), fee, burned, "sponsor fee paid");
        events.push(SimEvent::SponsorFeePaid {
            sponsor: sponsor.id,
            activity: kind,
            amount: fee,
            burned,
        });
        push_burn(events, burned, BurnCause::SponsorFee);
        Ok(None)
    }

    fn draw_cooldown<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let index = self.cooldowns.sample(rng);
        self.config
            .cooldown_options
            .get(index)
            .copied()
            .unwrap_or_default()
    }
}

/// Buy whatever `agent` lacks to hold `required` tokens.
///
/// A rejected buy is recorded and leaves the agent short.
fn buy_shortfall(
    market: &mut MarketContext<'_>,
    agent: &mut Agent,
    required: f64,
    events: &mut Vec<SimEvent>,
) {
    let shortfall = required - agent.tokens;
    if shortfall <= 0.0 || covers(agent.tokens, required) {
        return;
    }
    match market
        .exchange
        .buy(market.token, market.pools, agent, shortfall)
    {
        Ok(receipt) => events.extend(receipt.events(agent)),
        Err(err) => {
            debug!(agent = %agent.id, shortfall, error = %err, "shortfall buy rejected");
            events.push(rejection_event(
                Some(agent.id),
                TradeSide::Buy,
                shortfall,
                &err,
            ));
        }
    }
}

fn covers(held: f64, required: f64) -> bool {
    held >= required || approx_eq(held, required)
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn push_burn(events: &mut Vec<SimEvent>, amount: f64, cause: BurnCause) {
    if amount > 0.0 {
        events.push(SimEvent::TokensBurned { amount, cause });
    }
}

const fn set_cooldown(user: &mut Agent, value: u32) {
    if let AgentKind::Regular(params) = &mut user.kind {
        params.cooldown = value;
    }
}
