//! Allocation pools and the pool roster.
//!
//! A [`Pool`] holds a fixed share of total supply and releases it over time
//! according to its [`VestingSchedule`]. Vested tokens wait in
//! `available_unreleased` until the exchange draws them onto the market.
//! Investor-class pools are paid cash for every token they place on the
//! market; system-class pools may also hold `recycled` tokens forfeited by
//! activity participants.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::info;

use tokenomy_types::{PoolClass, PoolId, PoolRole, PoolSnapshot};

use crate::vesting::VestingSchedule;
use crate::{UtilityError, VestingError};

/// Mean of the investor sell-threshold distribution.
const SELL_THRESHOLD_MEAN: f64 = 5.0;
/// Standard deviation of the investor sell-threshold distribution.
const SELL_THRESHOLD_STD_DEV: f64 = 1.0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for one pool in the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Pool role.
    pub role: PoolRole,
    /// Share of total supply allocated to the pool, in `[0, 1]`.
    pub allocation: f64,
    /// Share of the allocation released at TGE, in `[0, 1]`.
    pub tge: f64,
    /// Number of linear monthly releases after TGE.
    pub vesting_months: u32,
    /// Share of `available_unreleased` placed on the market each tick.
    #[serde(default)]
    pub injection_ratio: f64,
}

impl PoolSpec {
    /// The standard six-pool roster.
    pub fn standard_roster() -> Vec<Self> {
        vec![
            Self::new(PoolRole::FriendsAndFamily, 0.025, 0.30, 12, 0.01),
            Self::new(PoolRole::TeamAndAdvisors, 0.195, 0.10, 24, 0.01),
            Self::new(PoolRole::PublicSaleAirdrop, 0.13, 0.20, 12, 1.0),
            Self::new(PoolRole::Mining, 0.27, 0.10, 36, 0.005),
            Self::new(PoolRole::Ecosystem, 0.28, 0.15, 24, 0.005),
            Self::new(PoolRole::Liquidity, 0.10, 1.0, 0, 0.0),
        ]
    }

    const fn new(
        role: PoolRole,
        allocation: f64,
        tge: f64,
        vesting_months: u32,
        injection_ratio: f64,
    ) -> Self {
        Self {
            role,
            allocation,
            tge,
            vesting_months,
            injection_ratio,
        }
    }
}

// ---------------------------------------------------------------------------
// Pool kinds
// ---------------------------------------------------------------------------

/// State specific to investor-class pools.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvestorParams {
    /// Cash received for tokens placed on the market.
    pub cash: f64,
    /// Sell utility the pool must reach before it injects.
    pub sell_threshold: f64,
}

/// State specific to system-class pools.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemParams {
    /// Already-circulating tokens forfeited to the pool.
    pub recycled: f64,
}

/// The class-specific part of a pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoolKind {
    /// Investor pool: paid on deposit, strict sell utility.
    Investor(InvestorParams),
    /// System pool: unpaid, may hold recycled tokens.
    System(SystemParams),
}

/// Result of running the vesting scheduler for one pool and tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VestingRelease {
    /// Tokens vested this tick (zero on non-release ticks).
    pub amount: f64,
    /// Cumulative tokens vested by the pool.
    pub cumulative: f64,
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// A token allocation pool.
#[derive(Debug, Clone)]
pub struct Pool {
    id: PoolId,
    role: PoolRole,
    total_allocation: f64,
    released: f64,
    available_unreleased: f64,
    tokens_on_market: f64,
    injection_ratio: f64,
    schedule: VestingSchedule,
    kind: PoolKind,
}

impl Pool {
    /// Create a pool from its [`PoolSpec`] with nothing released.
    ///
    /// Investor pools draw their sell threshold from `Normal(5, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`VestingError::InvalidSchedule`] if the allocation,
    /// TGE, or injection ratio is out of range.
    pub fn new<R: Rng + ?Sized>(
        spec: &PoolSpec,
        total_supply: f64,
        ticks_per_month: u64,
        rng: &mut R,
    ) -> Result<Self, VestingError> {
        if !(0.0..=1.0).contains(&spec.allocation) {
            return Err(VestingError::InvalidSchedule {
                role: spec.role,
                reason: "allocation must be within [0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&spec.injection_ratio) {
            return Err(VestingError::InvalidSchedule {
                role: spec.role,
                reason: "injection ratio must be within [0, 1]",
            });
        }
        let schedule =
            VestingSchedule::new(spec.role, spec.tge, spec.vesting_months, ticks_per_month)?;

        let kind = match spec.role.class() {
            PoolClass::Investor => {
                let sell_threshold = Normal::new(SELL_THRESHOLD_MEAN, SELL_THRESHOLD_STD_DEV)
                    .map_or(SELL_THRESHOLD_MEAN, |normal| normal.sample(rng));
                PoolKind::Investor(InvestorParams {
                    cash: 0.0,
                    sell_threshold,
                })
            }
            PoolClass::System => PoolKind::System(SystemParams::default()),
        };

        Ok(Self {
            id: PoolId::from_random_bytes(rng.random()),
            role: spec.role,
            total_allocation: total_supply * spec.allocation,
            released: 0.0,
            available_unreleased: 0.0,
            tokens_on_market: 0.0,
            injection_ratio: spec.injection_ratio,
            schedule,
            kind,
        })
    }

    /// Pool identifier.
    pub const fn id(&self) -> PoolId {
        self.id
    }

    /// Pool role.
    pub const fn role(&self) -> PoolRole {
        self.role
    }

    /// Fixed share of total supply held by the pool.
    pub const fn total_allocation(&self) -> f64 {
        self.total_allocation
    }

    /// Cumulative tokens vested so far.
    pub const fn released(&self) -> f64 {
        self.released
    }

    /// Vested tokens not yet placed on the market.
    pub const fn available_unreleased(&self) -> f64 {
        self.available_unreleased
    }

    /// Cumulative tokens placed on the market.
    pub const fn tokens_on_market(&self) -> f64 {
        self.tokens_on_market
    }

    /// Share of `available_unreleased` injected each tick.
    pub const fn injection_ratio(&self) -> f64 {
        self.injection_ratio
    }

    /// The vesting schedule.
    pub const fn schedule(&self) -> &VestingSchedule {
        &self.schedule
    }

    /// Class-specific state.
    pub const fn kind(&self) -> &PoolKind {
        &self.kind
    }

    /// Cash received for market deposits (zero for system pools).
    pub const fn cash(&self) -> f64 {
        match self.kind {
            PoolKind::Investor(params) => params.cash,
            PoolKind::System(_) => 0.0,
        }
    }

    /// Forfeited tokens held by the pool (zero for investor pools).
    pub const fn recycled(&self) -> f64 {
        match self.kind {
            PoolKind::Investor(_) => 0.0,
            PoolKind::System(params) => params.recycled,
        }
    }

    /// Run the vesting scheduler for `tick`.
    ///
    /// A repeated tick releases nothing. The release is capped so `released`
    /// never passes `total_allocation`.
    pub fn vest(&mut self, tick: u64) -> VestingRelease {
        let due = self.schedule.due(tick, self.total_allocation);
        let amount = due.min(self.total_allocation - self.released).max(0.0);
        if amount > 0.0 {
            self.released += amount;
            self.available_unreleased += amount;
            info!(
                tick,
                pool = self.role.as_str(),
                amount,
                cumulative = self.released,
                "vesting release"
            );
        }
        VestingRelease {
            amount,
            cumulative: self.released,
        }
    }

    /// Strict sell utility `ln(1 + 2 * released + price)`.
    ///
    /// # Errors
    ///
    /// Returns [`UtilityError::Domain`] if the argument is not strictly
    /// positive.
    pub fn sell_utility(&self, price: f64) -> Result<f64, UtilityError> {
        strict_sell_utility(self.released, price)
    }

    /// Tokens this pool wants to place on the market this tick.
    ///
    /// Investor pools only inject once their strict sell utility reaches
    /// their sell threshold.
    ///
    /// # Errors
    ///
    /// Propagates [`UtilityError::Domain`] from the investor sell utility.
    pub fn injection_amount(&self, price: f64) -> Result<f64, UtilityError> {
        if let PoolKind::Investor(params) = self.kind {
            if self.sell_utility(price)? < params.sell_threshold {
                return Ok(0.0);
            }
        }
        Ok(self.available_unreleased * self.injection_ratio)
    }

    /// Take `amount` out of the unreleased bucket.
    ///
    /// # Errors
    ///
    /// Returns [`VestingError::InsufficientUnreleased`] if the bucket holds
    /// less than `amount`; the pool is unchanged.
    pub fn withdraw_unreleased(&mut self, amount: f64) -> Result<(), VestingError> {
        if amount > self.available_unreleased {
            return Err(VestingError::InsufficientUnreleased {
                role: self.role,
                available: self.available_unreleased,
                amount,
            });
        }
        self.available_unreleased -= amount;
        Ok(())
    }

    /// Record `amount` tokens placed on the market, paid `cash`.
    ///
    /// System pools ignore the cash.
    pub fn record_market_deposit(&mut self, amount: f64, cash: f64) {
        self.tokens_on_market += amount;
        if let PoolKind::Investor(params) = &mut self.kind {
            params.cash += cash;
        }
    }

    /// Credit forfeited, already-circulating tokens to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`VestingError::NotRecyclable`] for investor pools.
    pub fn recycle(&mut self, amount: f64) -> Result<(), VestingError> {
        match &mut self.kind {
            PoolKind::System(params) => {
                params.recycled += amount;
                Ok(())
            }
            PoolKind::Investor(_) => Err(VestingError::NotRecyclable(self.role)),
        }
    }

    /// Reporting view of the pool's counters.
    pub const fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            released: self.released,
            available_unreleased: self.available_unreleased,
            tokens_on_market: self.tokens_on_market,
            cash: self.cash(),
        }
    }
}

/// Strict sell utility used by investor pools.
///
/// # Errors
///
/// Returns [`UtilityError::Domain`] if `1 + 2 * released + price` is not
/// strictly positive.
pub fn strict_sell_utility(released: f64, price: f64) -> Result<f64, UtilityError> {
    let argument = 1.0 + 2.0 * released + price;
    if argument.is_finite() && argument > 0.0 {
        Ok(argument.ln())
    } else {
        Err(UtilityError::Domain { argument })
    }
}

// ---------------------------------------------------------------------------
// Pool set
// ---------------------------------------------------------------------------

/// The run's roster of pools, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct PoolSet {
    pools: Vec<Pool>,
}

impl PoolSet {
    /// Build the roster from specs.
    ///
    /// # Errors
    ///
    /// Returns [`VestingError::DuplicatePool`] if a role appears twice, or
    /// any error from [`Pool::new`].
    pub fn from_specs<R: Rng + ?Sized>(
        specs: &[PoolSpec],
        total_supply: f64,
        ticks_per_month: u64,
        rng: &mut R,
    ) -> Result<Self, VestingError> {
        let mut pools: Vec<Pool> = Vec::with_capacity(specs.len());
        for spec in specs {
            if pools.iter().any(|p| p.role == spec.role) {
                return Err(VestingError::DuplicatePool(spec.role));
            }
            pools.push(Pool::new(spec, total_supply, ticks_per_month, rng)?);
        }
        Ok(Self { pools })
    }

    /// Number of pools.
    pub const fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether the roster is empty.
    pub const fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Look up a pool by role.
    pub fn get(&self, role: PoolRole) -> Option<&Pool> {
        self.pools.iter().find(|p| p.role == role)
    }

    /// Look up a pool by role, mutably.
    pub fn get_mut(&mut self, role: PoolRole) -> Option<&mut Pool> {
        self.pools.iter_mut().find(|p| p.role == role)
    }

    /// Iterate over pools in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Pool> {
        self.pools.iter()
    }

    /// Iterate mutably over pools in roster order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pool> {
        self.pools.iter_mut()
    }

    /// Roles in roster order.
    pub fn roles(&self) -> Vec<PoolRole> {
        self.pools.iter().map(|p| p.role).collect()
    }

    /// Sum of all allocations.
    pub fn total_allocation(&self) -> f64 {
        self.pools.iter().map(|p| p.total_allocation).sum()
    }

    /// Sum of all vested tokens.
    pub fn total_released(&self) -> f64 {
        self.pools.iter().map(|p| p.released).sum()
    }

    /// Sum of all tokens placed on the market.
    pub fn total_tokens_on_market(&self) -> f64 {
        self.pools.iter().map(|p| p.tokens_on_market).sum()
    }

    /// Sum of recycled tokens across system pools.
    pub fn total_recycled(&self) -> f64 {
        self.pools.iter().map(Pool::recycled).sum()
    }

    /// Run the vesting scheduler for every pool.
    pub fn vest_all(&mut self, tick: u64) -> Vec<(PoolRole, VestingRelease)> {
        self.pools
            .iter_mut()
            .map(|p| (p.role, p.vest(tick)))
            .collect()
    }
}
