//! Error types for the tokenomy-agents crate.
//!
//! Exchange rejections are ordinary per-agent outcomes: the caller records
//! them and moves on. Activity errors wrap invariant breaks from the ledger
//! that should never happen in a consistent run.

use tokenomy_ledger::{TokenError, VestingError};
use tokenomy_types::{PoolRole, RejectionReason};

/// Errors returned by [`Exchange`](crate::exchange::Exchange) operations.
///
/// Every variant leaves all balances untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExchangeError {
    /// Quantity was zero, negative, or not finite.
    #[error("trade amount must be positive and finite, got {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: f64,
    },

    /// Buyer cash, seller tokens, or pool unreleased tokens too low.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        /// Amount needed.
        required: f64,
        /// Amount held.
        available: f64,
    },

    /// The market cannot cover a buy even with the liquidity reserve.
    #[error("market holds {available} (+{reserve} reserve), cannot fill {amount}")]
    InsufficientMarketSupply {
        /// Tokens requested.
        amount: f64,
        /// Tokens on the market.
        available: f64,
        /// Tokens in the liquidity reserve.
        reserve: f64,
    },

    /// The deposit source is not a pool on the roster.
    #[error("pool {0} is not on the roster")]
    InvalidSource(PoolRole),

    /// The token ledger refused the supply movement.
    #[error("token ledger rejected movement: {source}")]
    Token {
        /// The underlying token error.
        #[from]
        source: TokenError,
    },

    /// The pool refused the withdrawal.
    #[error("pool rejected withdrawal: {source}")]
    Vesting {
        /// The underlying pool error.
        #[from]
        source: VestingError,
    },
}

impl ExchangeError {
    /// The reporting category for this rejection.
    pub const fn reason(&self) -> RejectionReason {
        match self {
            Self::InvalidAmount { .. } => RejectionReason::InvalidAmount,
            Self::InsufficientBalance { .. } | Self::Vesting { .. } => {
                RejectionReason::InsufficientBalance
            }
            Self::InsufficientMarketSupply { .. } | Self::Token { .. } => {
                RejectionReason::InsufficientMarketSupply
            }
            Self::InvalidSource(_) => RejectionReason::InvalidSource,
        }
    }
}

/// Errors raised while resolving an activity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivityError {
    /// Only regular users take part in activities.
    #[error("agent is not a regular user")]
    NotARegularUser,

    /// A sponsored activity was run without its sponsor.
    #[error("sponsored activity has no sponsor")]
    MissingSponsor,

    /// The pool that receives forfeited stakes is not on the roster.
    #[error("pool {0} is not on the roster")]
    MissingPool(PoolRole),

    /// Cooldown options or weights cannot form a distribution.
    #[error("invalid cooldown distribution: {0}")]
    InvalidCooldown(&'static str),

    /// A probability, share, or reward is out of range.
    #[error("invalid activity parameter: {0}")]
    InvalidParameter(&'static str),

    /// The token ledger refused a burn or release.
    #[error("token ledger error: {source}")]
    Token {
        /// The underlying token error.
        #[from]
        source: TokenError,
    },

    /// A pool refused a recycle.
    #[error("pool error: {source}")]
    Vesting {
        /// The underlying pool error.
        #[from]
        source: VestingError,
    },
}

/// Errors raised while building the agent population.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PopulationError {
    /// A population parameter is out of range.
    #[error("invalid population parameter: {0}")]
    InvalidParameter(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reasons_map_to_categories() {
        assert_eq!(
            ExchangeError::InvalidAmount { amount: -1.0 }.reason(),
            RejectionReason::InvalidAmount
        );
        assert_eq!(
            ExchangeError::InvalidSource(PoolRole::Mining).reason(),
            RejectionReason::InvalidSource
        );
        assert_eq!(
            ExchangeError::InsufficientMarketSupply {
                amount: 1.0,
                available: 0.0,
                reserve: 0.0
            }
            .reason(),
            RejectionReason::InsufficientMarketSupply
        );
    }

    #[test]
    fn token_errors_convert() {
        let err: ActivityError = TokenError::InvalidAmount { amount: 0.0 }.into();
        assert!(matches!(err, ActivityError::Token { .. }));
    }
}
