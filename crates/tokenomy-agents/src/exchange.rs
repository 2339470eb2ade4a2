//! The exchange: market inventory, trade settlement, and price formation.
//!
//! The [`Exchange`] owns the authoritative count of tokens available for
//! purchase and the per-tick demand and supply accumulators. It never owns
//! the [`Token`], the pools, or the agents: every operation borrows them
//! explicitly for the duration of the call.
//!
//! # Atomicity
//!
//! [`Exchange::buy`], [`Exchange::sell`], and [`Exchange::deposit_to_market`]
//! validate every precondition before touching any balance. A rejected call
//! returns an [`ExchangeError`] and leaves all state unchanged.
//!
//! # Liquidity top-up
//!
//! When a buy asks for more than the market holds, the exchange first moves
//! the liquidity pool's entire vested reserve onto the market, then fills
//! the order. A buy the reserve cannot cover is rejected before the top-up.

use std::collections::BTreeMap;

use tracing::debug;

use tokenomy_ledger::{Pool, PoolKind, PoolSet, PriceUpdate, Token};
use tokenomy_types::{AgentId, PoolRole, SimEvent, TradeSide};

use crate::agent::Agent;
use crate::error::ExchangeError;

/// Who placed tokens on the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Contributor {
    /// A vesting pool deposit.
    Pool(PoolRole),
    /// An agent sale.
    Agent(AgentId),
}

/// A completed buy or sell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeReceipt {
    /// Buy or sell.
    pub side: TradeSide,
    /// Tokens moved.
    pub amount: f64,
    /// Price per token at settlement.
    pub price: f64,
    /// Tokens the liquidity pool placed on the market to fill the order.
    pub top_up: Option<f64>,
}

impl TradeReceipt {
    /// Cash that changed hands.
    pub fn value(&self) -> f64 {
        self.amount * self.price
    }

    /// Structured events describing the trade.
    pub fn events(&self, agent: &Agent) -> Vec<SimEvent> {
        let mut events = Vec::with_capacity(3);
        if let Some(amount) = self.top_up {
            events.push(SimEvent::MarketDeposit {
                pool: PoolRole::Liquidity,
                amount,
                cash_paid: 0.0,
            });
            events.push(SimEvent::LiquidityTopUp { amount });
        }
        events.push(SimEvent::TradeExecuted {
            agent: agent.id,
            class: agent.class(),
            side: self.side,
            amount: self.amount,
            price: self.price,
        });
        events
    }
}

/// A completed pool deposit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deposit {
    /// Depositing pool.
    pub pool: PoolRole,
    /// Tokens placed on the market.
    pub amount: f64,
    /// Cash paid to the pool.
    pub cash_paid: f64,
}

impl Deposit {
    /// Structured event describing the deposit.
    pub const fn event(&self) -> SimEvent {
        SimEvent::MarketDeposit {
            pool: self.pool,
            amount: self.amount,
            cash_paid: self.cash_paid,
        }
    }
}

/// Build the event for a rejected trade.
pub fn rejection_event(
    agent: Option<AgentId>,
    side: TradeSide,
    amount: f64,
    error: &ExchangeError,
) -> SimEvent {
    SimEvent::TradeRejected {
        agent,
        side,
        amount,
        reason: error.reason(),
    }
}

/// The token market.
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    available: f64,
    demand: f64,
    supply: f64,
    tokens_on_market: f64,
    holdings: BTreeMap<Contributor, f64>,
}

impl Exchange {
    /// Create an empty market.
    pub const fn new() -> Self {
        Self {
            available: 0.0,
            demand: 0.0,
            supply: 0.0,
            tokens_on_market: 0.0,
            holdings: BTreeMap::new(),
        }
    }

    /// Tokens currently available for purchase.
    pub const fn available(&self) -> f64 {
        self.available
    }

    /// Demand accumulated since the last price update.
    pub const fn demand(&self) -> f64 {
        self.demand
    }

    /// Supply accumulated since the last price update.
    pub const fn supply(&self) -> f64 {
        self.supply
    }

    /// Cumulative tokens deposited by pools.
    pub const fn tokens_on_market(&self) -> f64 {
        self.tokens_on_market
    }

    /// Cumulative tokens each contributor placed on the market.
    pub const fn holdings(&self) -> &BTreeMap<Contributor, f64> {
        &self.holdings
    }

    /// Buy `amount` tokens for `agent` at the current price.
    ///
    /// # Errors
    ///
    /// - [`ExchangeError::InvalidAmount`] for a non-positive amount.
    /// - [`ExchangeError::InsufficientBalance`] if the agent cannot pay.
    /// - [`ExchangeError::InsufficientMarketSupply`] if the market and the
    ///   liquidity reserve together cannot fill the order.
    pub fn buy(
        &mut self,
        token: &mut Token,
        pools: &mut PoolSet,
        agent: &mut Agent,
        amount: f64,
    ) -> Result<TradeReceipt, ExchangeError> {
        validate_amount(amount)?;
        let price = token.price();
        let cost = amount * price;
        if cost > agent.cash {
            return Err(ExchangeError::InsufficientBalance {
                required: cost,
                available: agent.cash,
            });
        }

        let reserve = pools
            .get(PoolRole::Liquidity)
            .map_or(0.0, Pool::available_unreleased);
        if amount > self.available + reserve {
            return Err(ExchangeError::InsufficientMarketSupply {
                amount,
                available: self.available,
                reserve,
            });
        }

        let top_up = if amount > self.available {
            let deposit = self.deposit_to_market(token, pools, PoolRole::Liquidity, reserve)?;
            debug!(
                tick = token.tick(),
                amount = deposit.amount,
                "liquidity top-up"
            );
            Some(deposit.amount)
        } else {
            None
        };

        self.available = (self.available - amount).max(0.0);
        self.demand += amount;
        agent.tokens += amount;
        agent.cash = (agent.cash - cost).max(0.0);

        Ok(TradeReceipt {
            side: TradeSide::Buy,
            amount,
            price,
            top_up,
        })
    }

    /// Sell `amount` of `agent`'s tokens at the current price.
    ///
    /// # Errors
    ///
    /// - [`ExchangeError::InvalidAmount`] for a non-positive amount.
    /// - [`ExchangeError::InsufficientBalance`] if the agent holds fewer
    ///   tokens than `amount`.
    pub fn sell(
        &mut self,
        token: &Token,
        agent: &mut Agent,
        amount: f64,
    ) -> Result<TradeReceipt, ExchangeError> {
        validate_amount(amount)?;
        if amount > agent.tokens {
            return Err(ExchangeError::InsufficientBalance {
                required: amount,
                available: agent.tokens,
            });
        }
        let price = token.price();

        agent.tokens -= amount;
        agent.cash += amount * price;
        self.available += amount;
        self.supply += amount;
        *self.holdings.entry(Contributor::Agent(agent.id)).or_insert(0.0) += amount;

        Ok(TradeReceipt {
            side: TradeSide::Sell,
            amount,
            price,
            top_up: None,
        })
    }

    /// Move `amount` vested tokens from pool `role` onto the market.
    ///
    /// The tokens enter circulation, the deposit counts as supply for the
    /// next price update, and investor pools are paid `price * amount`.
    ///
    /// # Errors
    ///
    /// - [`ExchangeError::InvalidSource`] if `role` is not on the roster.
    /// - [`ExchangeError::InvalidAmount`] for a non-positive amount.
    /// - [`ExchangeError::InsufficientBalance`] if the pool's unreleased
    ///   bucket holds less than `amount`.
    /// - [`ExchangeError::Token`] if the release would pass total supply.
    pub fn deposit_to_market(
        &mut self,
        token: &mut Token,
        pools: &mut PoolSet,
        role: PoolRole,
        amount: f64,
    ) -> Result<Deposit, ExchangeError> {
        let pool = pools.get_mut(role).ok_or(ExchangeError::InvalidSource(role))?;
        validate_amount(amount)?;
        if amount > pool.available_unreleased() {
            return Err(ExchangeError::InsufficientBalance {
                required: amount,
                available: pool.available_unreleased(),
            });
        }

        token.release(amount)?;
        pool.withdraw_unreleased(amount)?;
        let cash_paid = match pool.kind() {
            PoolKind::Investor(_) => amount * token.price(),
            PoolKind::System(_) => 0.0,
        };
        pool.record_market_deposit(amount, cash_paid);

        self.available += amount;
        self.supply += amount;
        self.tokens_on_market += amount;
        *self.holdings.entry(Contributor::Pool(role)).or_insert(0.0) += amount;

        Ok(Deposit {
            pool: role,
            amount,
            cash_paid,
        })
    }

    /// Place every pool's per-tick injection on the market.
    ///
    /// Pools whose injection is zero are skipped. A pool whose strict sell
    /// utility or deposit fails is skipped and reported.
    pub fn inject_supply(&mut self, token: &mut Token, pools: &mut PoolSet) -> Vec<SimEvent> {
        let price = token.price();
        let plan: Vec<(PoolRole, f64)> = pools
            .iter()
            .filter_map(|pool| match pool.injection_amount(price) {
                Ok(amount) => Some((pool.role(), amount)),
                Err(err) => {
                    debug!(pool = pool.role().as_str(), error = %err, "injection skipped");
                    None
                }
            })
            .filter(|(_, amount)| *amount > 0.0)
            .collect();

        let mut events = Vec::with_capacity(plan.len());
        for (role, amount) in plan {
            match self.deposit_to_market(token, pools, role, amount) {
                Ok(deposit) => events.push(deposit.event()),
                Err(err) => {
                    debug!(pool = role.as_str(), amount, error = %err, "deposit rejected");
                    events.push(rejection_event(None, TradeSide::Sell, amount, &err));
                }
            }
        }
        events
    }

    /// Form the tick's price from accumulated demand and supply, then reset
    /// both accumulators.
    pub fn update_market_price(&mut self, token: &mut Token) -> PriceUpdate {
        let update = token.update_price(self.demand, self.supply);
        self.demand = 0.0;
        self.supply = 0.0;
        update
    }
}

fn validate_amount(amount: f64) -> Result<(), ExchangeError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(ExchangeError::InvalidAmount { amount })
    }
}
