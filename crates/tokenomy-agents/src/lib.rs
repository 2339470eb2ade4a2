//! Agents, utilities, the exchange, and activities for the Tokenomy
//! simulation.
//!
//! This crate holds every rule that moves tokens or cash between
//! participants. It sits between `tokenomy-ledger` (supply, price, pools)
//! and `tokenomy-core` (the tick loop), and performs no I/O.
//!
//! # Modules
//!
//! - [`activity`] -- Activity gates and outcomes ([`ActivityEngine`])
//! - [`agent`] -- Agents, the administrator, and the population roster
//! - [`config`] -- Population, trading, and activity parameters
//! - [`error`] -- Error types ([`ExchangeError`], [`ActivityError`])
//! - [`exchange`] -- Market inventory, trades, deposits, and price formation
//! - [`utility`] -- Utility functions and the speculator trade decision

pub mod activity;
pub mod agent;
pub mod config;
pub mod error;
pub mod exchange;
pub mod utility;

pub use activity::{ActivityEngine, ActivityReport, MarketContext, dynamic_threshold};
pub use agent::{
    Administrator, Agent, AgentKind, Population, RegularParams, SpeculatorParams, SponsorParams,
    growth_increment,
};
pub use config::{
    ActivitiesConfig, GrowthCadence, PopulationConfig, SponsoredActivityConfig,
    StakeActivityConfig, TradingConfig, UniformRange,
};
pub use error::{ActivityError, ExchangeError, PopulationError};
pub use exchange::{Contributor, Deposit, Exchange, TradeReceipt};
pub use utility::{TradeIntent, activity_utility, decide_trade, speculator_utilities};
