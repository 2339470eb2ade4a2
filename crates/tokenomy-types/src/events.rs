//! Structured per-tick event records.
//!
//! Every state change that the reporting layer may want to see is returned
//! from the operation that caused it as a [`SimEvent`]. The tick engine
//! gathers them into the tick summary when event recording is enabled.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActivityKind, AgentClass, PoolRole, RejectionReason, TradeSide};
use crate::ids::AgentId;

/// How a single user's activity attempt resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActivityOutcome {
    /// User is still cooling down from a previous activity.
    OnCooldown {
        /// Ticks remaining after this tick's decrement.
        remaining: u32,
    },
    /// User's utility did not exceed the dynamic threshold.
    BelowThreshold {
        /// The user's utility for this activity.
        utility: f64,
        /// The threshold it had to exceed.
        threshold: f64,
    },
    /// User could not hold the stake even after buying the shortfall.
    InsufficientStake {
        /// Tokens held after the shortfall purchase attempt.
        held: f64,
        /// Stake required by the activity.
        required: f64,
    },
    /// The sponsor could not pay its fee or cover the reward.
    SponsorUnfunded {
        /// Tokens the sponsor holds.
        held: f64,
        /// Tokens it needed.
        required: f64,
    },
    /// The reward emission would exceed total supply; the stake was kept.
    RewardUnfunded {
        /// Tokens the emission asked for.
        requested: f64,
    },
    /// User won the draw.
    Won {
        /// Net change in the user's token balance.
        net_tokens: f64,
    },
    /// User lost the draw.
    Lost {
        /// Net change in the user's token balance (zero or negative).
        net_tokens: f64,
    },
}

impl ActivityOutcome {
    /// Whether the user actually took part (passed every gate).
    pub const fn participated(&self) -> bool {
        matches!(self, Self::Won { .. } | Self::Lost { .. })
    }
}

/// A structured record of one state change in the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SimEvent {
    /// A pool vested tokens (TGE or monthly release).
    VestingReleased {
        /// The tick of the release.
        tick: u64,
        /// Releasing pool.
        pool: PoolRole,
        /// Tokens vested this tick.
        amount: f64,
        /// Cumulative tokens vested by the pool.
        cumulative: f64,
    },
    /// A pool placed vested tokens onto the exchange.
    MarketDeposit {
        /// Depositing pool.
        pool: PoolRole,
        /// Tokens deposited.
        amount: f64,
        /// Cash paid to the pool (investor pools only).
        cash_paid: f64,
    },
    /// The exchange drew the liquidity pool's reserve to satisfy a buy.
    LiquidityTopUp {
        /// Tokens moved onto the market.
        amount: f64,
    },
    /// A buy or sell completed.
    TradeExecuted {
        /// Trading agent.
        agent: AgentId,
        /// Class of the trading agent.
        class: AgentClass,
        /// Buy or sell.
        side: TradeSide,
        /// Tokens traded.
        amount: f64,
        /// Price per token.
        price: f64,
    },
    /// A buy, sell, or deposit was refused without touching any balance.
    TradeRejected {
        /// Trading agent, if the request came from an agent.
        agent: Option<AgentId>,
        /// Buy or sell.
        side: TradeSide,
        /// Tokens requested.
        amount: f64,
        /// Why the request was refused.
        reason: RejectionReason,
    },
    /// A user's activity attempt resolved.
    ActivityResolved {
        /// Participating user.
        agent: AgentId,
        /// Activity that was drawn.
        activity: ActivityKind,
        /// How it resolved.
        outcome: ActivityOutcome,
    },
    /// A sponsor paid its periodic fee to the administrator.
    SponsorFeePaid {
        /// Paying sponsor.
        sponsor: AgentId,
        /// Activity the fee funds.
        activity: ActivityKind,
        /// Fee in tokens.
        amount: f64,
        /// Portion of the fee that was burned.
        burned: f64,
    },
    /// Tokens left circulation.
    TokensBurned {
        /// Tokens burned.
        amount: f64,
        /// What caused the burn.
        cause: BurnCause,
    },
    /// The growth model added agents.
    PopulationGrew {
        /// Class of the new agents.
        class: AgentClass,
        /// Number of agents added.
        added: u64,
        /// Roster size after growth.
        total: u64,
    },
    /// The exchange formed a new price from the tick's demand and supply.
    PriceUpdated {
        /// Price before the update.
        previous: f64,
        /// Price after the update.
        price: f64,
        /// Demand accumulated this tick.
        demand: f64,
        /// Supply accumulated this tick.
        supply: f64,
    },
    /// Holdings no longer sum to circulating supply.
    ConservationAnomaly {
        /// Sum of all holdings.
        holdings: f64,
        /// Circulating supply according to the token ledger.
        circulating: f64,
    },
}

/// Why tokens were burned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BurnCause {
    /// Share of a forfeited standard-activity stake.
    ForfeitedStake,
    /// Stake of a won burning or mining activity.
    ActivityWin,
    /// Share of a sponsor fee.
    SponsorFee,
}
