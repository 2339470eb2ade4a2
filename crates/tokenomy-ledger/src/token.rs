//! The token: fixed total supply, circulating supply, and price.
//!
//! [`Token`] is a single owned value passed by reference into every
//! operation that needs it. Its counters change only through
//! [`Token::release`], [`Token::burn`], and [`Token::update_price`].
//!
//! # Price formation
//!
//! Price follows a per-tick elasticity model over the demand and supply
//! accumulated by the exchange during the tick:
//!
//! ```text
//! demand >= supply:  price *= 1 + elasticity * demand / supply
//! demand <  supply:  price *= 1 - elasticity * demand / supply
//! supply == 0:       price unchanged
//! ```
//!
//! A candidate price that is not finite and positive is discarded.

use tracing::warn;

use crate::TokenError;
use crate::journal::SupplyJournal;

/// Relative slack allowed when comparing circulating supply to the cap.
const SUPPLY_CAP_TOLERANCE: f64 = 1e-9;

/// Outcome of a single price update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceUpdate {
    /// Price before the update.
    pub previous: f64,
    /// Price after the update.
    pub price: f64,
}

impl PriceUpdate {
    /// Whether the update moved the price.
    pub fn changed(&self) -> bool {
        (self.price - self.previous).abs() > f64::EPSILON * self.previous.abs()
    }
}

/// Supply and price state of the simulated token.
#[derive(Debug, Clone)]
pub struct Token {
    total_supply: f64,
    circulating_supply: f64,
    price: f64,
    elasticity: f64,
    total_burned: f64,
    tick: u64,
    journal: SupplyJournal,
}

impl Token {
    /// Create a token with nothing in circulation.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidParameters`] if the supply or price is not
    /// positive and finite, or the elasticity is outside `[0, 1]`.
    pub fn new(total_supply: f64, price: f64, elasticity: f64) -> Result<Self, TokenError> {
        if !(total_supply.is_finite() && total_supply > 0.0) {
            return Err(TokenError::InvalidParameters(
                "total supply must be positive",
            ));
        }
        if !(price.is_finite() && price > 0.0) {
            return Err(TokenError::InvalidParameters("price must be positive"));
        }
        if !(0.0..=1.0).contains(&elasticity) {
            return Err(TokenError::InvalidParameters(
                "elasticity must be within [0, 1]",
            ));
        }
        Ok(Self {
            total_supply,
            circulating_supply: 0.0,
            price,
            elasticity,
            total_burned: 0.0,
            tick: 0,
            journal: SupplyJournal::new(),
        })
    }

    /// Fixed total supply.
    pub const fn total_supply(&self) -> f64 {
        self.total_supply
    }

    /// Tokens currently in circulation.
    pub const fn circulating_supply(&self) -> f64 {
        self.circulating_supply
    }

    /// Current price per token.
    pub const fn price(&self) -> f64 {
        self.price
    }

    /// Price sensitivity coefficient.
    pub const fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Cumulative tokens burned.
    pub const fn total_burned(&self) -> f64 {
        self.total_burned
    }

    /// The tick supply movements are currently journaled under.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The supply journal.
    pub const fn journal(&self) -> &SupplyJournal {
        &self.journal
    }

    /// Tokens that could still be released before hitting the cap.
    pub fn headroom(&self) -> f64 {
        (self.total_supply - self.circulating_supply).max(0.0)
    }

    /// Set the tick under which subsequent movements are journaled.
    pub const fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Put `amount` new tokens into circulation.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidAmount`] for a non-positive or non-finite
    /// amount, and [`TokenError::SupplyCapExceeded`] if circulating supply
    /// would pass the total supply.
    pub fn release(&mut self, amount: f64) -> Result<(), TokenError> {
        validate_amount(amount)?;
        let after = self.circulating_supply + amount;
        if after > self.total_supply * (1.0 + SUPPLY_CAP_TOLERANCE) {
            return Err(TokenError::SupplyCapExceeded {
                amount,
                circulating: self.circulating_supply,
                total: self.total_supply,
            });
        }
        self.circulating_supply = after;
        self.journal.record_release(self.tick, amount);
        Ok(())
    }

    /// Remove `amount` tokens from circulation.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidAmount`] for a non-positive or non-finite
    /// amount, and [`TokenError::BurnExceedsCirculating`] if more is burned
    /// than circulates. The latter is an invariant break in the caller and
    /// is logged as a warning.
    pub fn burn(&mut self, amount: f64) -> Result<(), TokenError> {
        validate_amount(amount)?;
        if amount > self.circulating_supply * (1.0 + SUPPLY_CAP_TOLERANCE) {
            warn!(
                tick = self.tick,
                amount,
                circulating = self.circulating_supply,
                "burn exceeds circulating supply"
            );
            return Err(TokenError::BurnExceedsCirculating {
                amount,
                circulating: self.circulating_supply,
            });
        }
        self.circulating_supply = (self.circulating_supply - amount).max(0.0);
        self.total_burned += amount;
        self.journal.record_burn(self.tick, amount);
        Ok(())
    }

    /// Form a new price from a tick's accumulated demand and supply.
    ///
    /// Negative or non-finite inputs are treated as zero.
    pub fn update_price(&mut self, demand: f64, supply: f64) -> PriceUpdate {
        let previous = self.price;
        let demand = sanitize(demand);
        let supply = sanitize(supply);
        if supply <= 0.0 {
            return PriceUpdate {
                previous,
                price: previous,
            };
        }

        let ratio = demand / supply;
        let factor = if demand >= supply {
            1.0 + self.elasticity * ratio
        } else {
            1.0 - self.elasticity * ratio
        };
        let candidate = previous * factor;
        if candidate.is_finite() && candidate > 0.0 {
            self.price = candidate;
        }
        PriceUpdate {
            previous,
            price: self.price,
        }
    }
}

/// Reject amounts that are not strictly positive and finite.
fn validate_amount(amount: f64) -> Result<(), TokenError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(TokenError::InvalidAmount { amount })
    }
}

/// Map negative and non-finite accumulator values to zero.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn token() -> Token {
        Token::new(1_000_000.0, 0.01, 0.5).unwrap()
    }

    #[test]
    fn new_token_has_nothing_circulating() {
        let t = token();
        assert!(t.circulating_supply().abs() < f64::EPSILON);
        assert!((t.price() - 0.01).abs() < f64::EPSILON);
        assert!((t.headroom() - 1_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(Token::new(0.0, 0.01, 0.5).is_err());
        assert!(Token::new(100.0, -1.0, 0.5).is_err());
        assert!(Token::new(100.0, 0.01, 1.5).is_err());
        assert!(Token::new(f64::NAN, 0.01, 0.5).is_err());
    }

    #[test]
    fn release_and_burn_track_circulation() {
        let mut t = token();
        t.release(500.0).unwrap();
        t.burn(200.0).unwrap();
        assert!((t.circulating_supply() - 300.0).abs() < 1e-9);
        assert!((t.total_burned() - 200.0).abs() < 1e-9);
        assert!((t.journal().total_released() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_amounts_rejected() {
        let mut t = token();
        assert_eq!(
            t.release(-1.0),
            Err(TokenError::InvalidAmount { amount: -1.0 })
        );
        assert!(t.release(0.0).is_err());
        assert!(t.burn(f64::INFINITY).is_err());
        assert!(t.circulating_supply().abs() < f64::EPSILON);
    }

    #[test]
    fn over_burn_rejected_and_state_unchanged() {
        let mut t = token();
        t.release(10.0).unwrap();
        let result = t.burn(11.0);
        assert!(matches!(
            result,
            Err(TokenError::BurnExceedsCirculating { .. })
        ));
        assert!((t.circulating_supply() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn release_past_cap_rejected() {
        let mut t = token();
        t.release(999_999.0).unwrap();
        assert!(matches!(
            t.release(2.0),
            Err(TokenError::SupplyCapExceeded { .. })
        ));
        assert!(t.release(1.0).is_ok());
    }

    #[test]
    fn price_rises_when_demand_dominates() {
        let mut t = token();
        let update = t.update_price(200.0, 100.0);
        assert!((update.price - 0.01 * 2.0).abs() < 1e-12);
        assert!(update.changed());
    }

    #[test]
    fn price_falls_when_supply_dominates() {
        let mut t = token();
        let update = t.update_price(50.0, 100.0);
        assert!((update.price - 0.01 * 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_supply_leaves_price_unchanged() {
        let mut t = token();
        let update = t.update_price(1_000.0, 0.0);
        assert!(!update.changed());
        assert!((t.price() - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn price_stays_positive_under_random_updates() {
        let mut t = Token::new(1_000_000.0, 0.01, 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..10_000 {
            let demand = rng.random_range(0.0..1_000.0);
            let supply = rng.random_range(0.0..1_000.0);
            t.update_price(demand, supply);
            assert!(t.price() > 0.0);
            assert!(t.price().is_finite());
        }
    }

    #[test]
    fn movements_journaled_under_current_tick() {
        let mut t = token();
        t.set_tick(4);
        t.release(10.0).unwrap();
        let row = t.journal().for_tick(4).copied().unwrap();
        assert!((row.released - 10.0).abs() < 1e-9);
    }
}
