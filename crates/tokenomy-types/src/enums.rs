//! Enumeration types for the Tokenomy simulation.
//!
//! Pool roles, agent classes, activity kinds, and trade outcomes. Every enum
//! that names a reporting series exposes a stable snake-case key via
//! `as_str()`, which is what series maps and log fields use.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

/// The role a token allocation pool plays in the economy.
///
/// Investor roles receive cash when their tokens reach the market; system
/// roles do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PoolRole {
    /// Early friends-and-family investors.
    FriendsAndFamily,
    /// Founding team and advisors.
    TeamAndAdvisors,
    /// Public sale and airdrop distribution.
    PublicSaleAirdrop,
    /// Mining rewards pool; receives forfeited mining stakes.
    Mining,
    /// Ecosystem fund; receives forfeited burning-activity stakes.
    Ecosystem,
    /// Market-making reserve used to top up the exchange on demand.
    Liquidity,
}

impl PoolRole {
    /// All roles, in the order the standard roster lists them.
    pub const ALL: [Self; 6] = [
        Self::FriendsAndFamily,
        Self::TeamAndAdvisors,
        Self::PublicSaleAirdrop,
        Self::Mining,
        Self::Ecosystem,
        Self::Liquidity,
    ];

    /// Stable snake-case key used for series names and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FriendsAndFamily => "friends_and_family",
            Self::TeamAndAdvisors => "team_and_advisors",
            Self::PublicSaleAirdrop => "public_sale_airdrop",
            Self::Mining => "mining",
            Self::Ecosystem => "ecosystem",
            Self::Liquidity => "liquidity",
        }
    }

    /// The class a pool with this role belongs to.
    pub const fn class(self) -> PoolClass {
        match self {
            Self::FriendsAndFamily | Self::TeamAndAdvisors => PoolClass::Investor,
            Self::PublicSaleAirdrop | Self::Mining | Self::Ecosystem | Self::Liquidity => {
                PoolClass::System
            }
        }
    }
}

impl core::fmt::Display for PoolRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad class of a pool: investor pools are paid for market deposits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PoolClass {
    /// Investor-class pool (cash on deposit, strict sell utility).
    Investor,
    /// System-class pool (no cash on deposit).
    System,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// The class of a trading agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentClass {
    /// Regular user taking part in activities.
    Regular,
    /// Speculator trading on utility divergence.
    Speculator,
    /// Brand hosting sponsored activities.
    Brand,
    /// Data partner funding data-pool activities.
    DataPartner,
}

impl AgentClass {
    /// Stable snake-case key used for log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Speculator => "speculator",
            Self::Brand => "brand",
            Self::DataPartner => "data_partner",
        }
    }
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// The kind of stochastic activity a user can take part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActivityKind {
    /// Stake-and-win; losses go to the administrator with a partial burn.
    Standard,
    /// Winning burns the stake; losing sends it to the ecosystem pool.
    Burning,
    /// Winning burns the stake; losing sends it to the mining pool.
    Mining,
    /// Brand-hosted activity paying rewards from the brand's balance.
    Host,
    /// Data-partner activity paying rewards from the partner's balance.
    DataPool,
}

impl ActivityKind {
    /// All kinds, in roster order.
    pub const ALL: [Self; 5] = [
        Self::Standard,
        Self::Burning,
        Self::Mining,
        Self::DataPool,
        Self::Host,
    ];

    /// Stable snake-case key used for series names and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Burning => "burning",
            Self::Mining => "mining",
            Self::Host => "host",
            Self::DataPool => "data_pool",
        }
    }
}

impl core::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Trading
// ---------------------------------------------------------------------------

/// Direction of an exchange trade, from the agent's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TradeSide {
    /// Agent receives tokens and pays cash.
    Buy,
    /// Agent gives tokens and receives cash.
    Sell,
}

/// Why the exchange refused a trade or deposit.
///
/// Every rejection is a reported no-op: no balances were touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RejectionReason {
    /// Quantity was zero, negative, or not finite.
    InvalidAmount,
    /// Buyer cash or seller tokens too low.
    InsufficientBalance,
    /// Not enough tokens on the market even after a liquidity top-up.
    InsufficientMarketSupply,
    /// Deposit source is not an eligible pool.
    InvalidSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_role_classes() {
        assert_eq!(PoolRole::FriendsAndFamily.class(), PoolClass::Investor);
        assert_eq!(PoolRole::TeamAndAdvisors.class(), PoolClass::Investor);
        assert_eq!(PoolRole::Liquidity.class(), PoolClass::System);
        assert_eq!(PoolRole::Mining.class(), PoolClass::System);
    }

    #[test]
    fn series_keys_match_serde_names() {
        for role in PoolRole::ALL {
            let json = serde_json::to_string(&role).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        for kind in ActivityKind::ALL {
            let json = serde_json::to_string(&kind).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
