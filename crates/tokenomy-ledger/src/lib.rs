//! Token supply, vesting pools, and conservation checks for Tokenomy.
//!
//! Every token in the simulation is accounted for through this crate.
//! Tokens enter circulation only through [`Token::release`] and leave it
//! only through [`Token::burn`]; both are recorded in the append-only
//! [`SupplyJournal`]. The conservation law is checked at the end of every
//! tick.
//!
//! # Architecture
//!
//! - [`token`] -- The [`Token`] struct: supply counters and price formation.
//! - [`journal`] -- The per-tick append-only record of releases and burns.
//! - [`vesting`] -- The per-pool TGE + linear monthly release schedule.
//! - [`pool`] -- Allocation pools and the [`PoolSet`] roster.
//! - [`conservation`] -- Supply and holdings verification.
//!
//! # Conservation Law
//!
//! At every observation point:
//!
//! ```text
//! circulating == sum(releases) - sum(burns)
//! circulating == sum(agent tokens) + administrator tokens
//!              + exchange available + sum(pool recycled)
//! ```
//!
//! A violation produces a [`SupplyAnomaly`]. The ledger never panics; it
//! returns errors.
//!
//! # Usage
//!
//! ```
//! use tokenomy_ledger::Token;
//! use tokenomy_ledger::conservation::{verify_supply, ConservationResult};
//!
//! let mut token = Token::new(1_000_000.0, 0.01, 0.5).ok();
//! if let Some(token) = token.as_mut() {
//!     token.release(100.0).ok();
//!     token.burn(40.0).ok();
//!     assert_eq!(verify_supply(token), ConservationResult::Balanced);
//! }
//! ```

pub mod conservation;
pub mod journal;
pub mod pool;
pub mod token;
pub mod vesting;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use journal::{SupplyJournal, TickSupply};
pub use pool::{InvestorParams, Pool, PoolKind, PoolSet, PoolSpec, SystemParams, VestingRelease};
pub use token::{PriceUpdate, Token};
pub use vesting::VestingSchedule;

use tokenomy_types::PoolRole;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by [`Token`] supply operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenError {
    /// Amount was zero, negative, or not finite.
    #[error("token amount must be positive and finite, got {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: f64,
    },

    /// A burn asked for more than is in circulation.
    #[error("cannot burn {amount}: only {circulating} in circulation")]
    BurnExceedsCirculating {
        /// Amount requested.
        amount: f64,
        /// Circulating supply at the time of the request.
        circulating: f64,
    },

    /// A release would push circulating supply past the fixed total.
    #[error("cannot release {amount}: circulating {circulating} of total {total}")]
    SupplyCapExceeded {
        /// Amount requested.
        amount: f64,
        /// Circulating supply at the time of the request.
        circulating: f64,
        /// Fixed total supply.
        total: f64,
    },

    /// Token parameters were out of range at construction.
    #[error("invalid token parameters: {0}")]
    InvalidParameters(&'static str),
}

/// Errors raised by the vesting scheduler and pool counters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VestingError {
    /// Schedule parameters are inconsistent.
    #[error("invalid vesting schedule for {role}: {reason}")]
    InvalidSchedule {
        /// The pool the schedule belongs to.
        role: PoolRole,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A withdrawal from the unreleased bucket was larger than the bucket.
    #[error("{role} holds {available} unreleased, cannot take {amount}")]
    InsufficientUnreleased {
        /// The pool.
        role: PoolRole,
        /// Tokens available.
        available: f64,
        /// Tokens requested.
        amount: f64,
    },

    /// A pool role appeared more than once in a roster.
    #[error("pool {0} listed more than once")]
    DuplicatePool(PoolRole),

    /// Only system pools can hold forfeited tokens.
    #[error("pool {0} cannot hold recycled tokens")]
    NotRecyclable(PoolRole),
}

/// Errors raised by strict utility evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UtilityError {
    /// The logarithm argument was not strictly positive.
    #[error("utility argument {argument} is outside the logarithm domain")]
    Domain {
        /// The offending argument.
        argument: f64,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation law violation detected during verification.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyAnomaly {
    /// The tick where the anomaly was detected.
    pub tick: u64,
    /// The value the check expected.
    pub expected: f64,
    /// The value actually observed.
    pub actual: f64,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for SupplyAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
