//! Conservation law verification.
//!
//! Three checks, each returning a [`ConservationResult`]:
//!
//! - [`verify_supply`]: circulating supply equals the journal's releases
//!   minus burns.
//! - [`verify_holdings`]: the tokens held by every participant sum to
//!   circulating supply.
//! - [`verify_allocation`]: pools never vest more than they were allocated,
//!   and allocations never exceed total supply.
//!
//! Balances are `f64`, so equality is checked with a relative tolerance
//! that absorbs accumulated rounding over millions of small transfers.

use crate::pool::PoolSet;
use crate::token::Token;
use crate::SupplyAnomaly;

/// Relative tolerance for balance comparisons.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq)]
pub enum ConservationResult {
    /// The books balance.
    Balanced,
    /// The books do not balance.
    Anomaly(SupplyAnomaly),
}

impl ConservationResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Whether `a` and `b` agree within [`RELATIVE_TOLERANCE`].
///
/// Balances are `f64`, so exact equality does not survive repeated
/// transfers and the logarithmic price update. The tolerance is relative:
/// `|a - b| <= 1e-9 * max(|a|, |b|, 1)`, which stays meaningful for supplies
/// near 5e11 and falls back to an absolute 1e-9 near zero.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= RELATIVE_TOLERANCE * scale
}

/// Verify `circulating == sum(releases) - sum(burns)` from the journal.
pub fn verify_supply(token: &Token) -> ConservationResult {
    let journal = token.journal();
    let expected = journal.total_released() - journal.total_burned();
    let actual = token.circulating_supply();
    if approx_eq(expected, actual) {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(SupplyAnomaly {
            tick: token.tick(),
            expected,
            actual,
            message: format!(
                "SUPPLY_ANOMALY at tick {}: journal says {expected}, token says {actual}",
                token.tick()
            ),
        })
    }
}

/// Verify that the sum of all holdings equals circulating supply.
///
/// `holdings` is the caller's sum of agent tokens, administrator tokens,
/// exchange inventory, and pool recycled tokens.
pub fn verify_holdings(tick: u64, holdings: f64, circulating: f64) -> ConservationResult {
    if approx_eq(holdings, circulating) {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(SupplyAnomaly {
            tick,
            expected: circulating,
            actual: holdings,
            message: format!(
                "HOLDINGS_ANOMALY at tick {tick}: holdings {holdings} != circulating {circulating}"
            ),
        })
    }
}

/// Verify pool counters against their allocations and the total supply.
pub fn verify_allocation(tick: u64, pools: &PoolSet, total_supply: f64) -> ConservationResult {
    let allocated = pools.total_allocation();
    if allocated > total_supply && !approx_eq(allocated, total_supply) {
        return ConservationResult::Anomaly(SupplyAnomaly {
            tick,
            expected: total_supply,
            actual: allocated,
            message: format!(
                "ALLOCATION_ANOMALY at tick {tick}: pools allocate {allocated} of {total_supply}"
            ),
        });
    }

    for pool in pools.iter() {
        let over_vested = pool.released() > pool.total_allocation()
            && !approx_eq(pool.released(), pool.total_allocation());
        let over_unreleased = pool.available_unreleased() > pool.released()
            && !approx_eq(pool.available_unreleased(), pool.released());
        let negative = pool.available_unreleased() < 0.0 || pool.tokens_on_market() < 0.0;
        if over_vested || over_unreleased || negative {
            return ConservationResult::Anomaly(SupplyAnomaly {
                tick,
                expected: pool.total_allocation(),
                actual: pool.released(),
                message: format!(
                    "ALLOCATION_ANOMALY at tick {tick}: pool {} counters out of range",
                    pool.role()
                ),
            });
        }
    }
    ConservationResult::Balanced
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::pool::PoolSpec;

    #[test]
    fn fresh_token_is_balanced() {
        let token = Token::new(1_000.0, 1.0, 0.1).unwrap();
        assert!(verify_supply(&token).is_balanced());
    }

    #[test]
    fn releases_and_burns_balance() {
        let mut token = Token::new(1_000_000.0, 1.0, 0.1).unwrap();
        for tick in 0..50 {
            token.set_tick(tick);
            token.release(1_000.0).unwrap();
            token.burn(250.0).unwrap();
        }
        assert_eq!(verify_supply(&token), ConservationResult::Balanced);
        assert!((token.circulating_supply() - 37_500.0).abs() < 1e-6);
    }

    #[test]
    fn holdings_mismatch_is_anomaly() {
        let result = verify_holdings(7, 99.0, 100.0);
        let ConservationResult::Anomaly(anomaly) = result else {
            return;
        };
        assert_eq!(anomaly.tick, 7);
        assert!(anomaly.message.contains("HOLDINGS_ANOMALY"));
        assert!(!verify_holdings(7, 99.0, 100.0).is_balanced());
    }

    #[test]
    fn holdings_within_tolerance_balance() {
        let circulating = 5.0e10;
        assert!(verify_holdings(1, circulating + 1.0, circulating).is_balanced());
        assert!(!verify_holdings(1, circulating + 1_000.0, circulating).is_balanced());
    }

    #[test]
    fn standard_roster_allocation_balances_through_full_vesting() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pools =
            PoolSet::from_specs(&PoolSpec::standard_roster(), 1_000_000.0, 30, &mut rng).unwrap();
        for tick in 0..1_200 {
            pools.vest_all(tick);
            assert!(verify_allocation(tick, &pools, 1_000_000.0).is_balanced());
        }
    }

    #[test]
    fn over_allocated_roster_is_anomaly() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut specs = PoolSpec::standard_roster();
        if let Some(first) = specs.first_mut() {
            first.allocation = 0.5;
        }
        let pools = PoolSet::from_specs(&specs, 1_000.0, 30, &mut rng).unwrap();
        assert!(!verify_allocation(0, &pools, 1_000.0).is_balanced());
    }

    #[test]
    fn approx_eq_scales_with_magnitude() {
        assert!(approx_eq(0.0, 0.0));
        assert!(approx_eq(1.0e12, 1.0e12 + 1.0));
        assert!(!approx_eq(1.0, 1.001));
        assert!(approx_eq(5.0e11, 5.0e11 + 100.0));
        assert!(!approx_eq(5.0e11, 5.0e11 + 1_000.0));
        assert!(approx_eq(0.0, 1e-10));
        assert!(!approx_eq(0.0, 1e-8));
    }
}
