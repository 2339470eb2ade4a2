//! Agent utility functions and the speculator trade decision.
//!
//! All agent utilities share one shape: `rf * ln(max(1, argument))`, where
//! `rf` is the agent's random factor and `argument` is a weighted sum of its
//! tokens `t`, cash `c`, and holdings value `t * p`:
//!
//! | Utility | Argument |
//! |---------|----------|
//! | activity | `1 + 2t + c + t*p` |
//! | speculator buy | `1 + t + 2c + t*p` |
//! | speculator sell | `1 + 2t + c + t*p` |
//!
//! The floor at 1 keeps the logarithm defined for every non-negative
//! balance. The strict investor-pool utility lives in `tokenomy-ledger`.

use tokenomy_types::TradeSide;

use crate::agent::{Agent, AgentKind, SpeculatorParams};
use crate::config::TradingConfig;

/// `rf * ln(argument)`, with non-positive or non-finite arguments clamped to 1.
pub fn clamped_log_utility(random_factor: f64, argument: f64) -> f64 {
    let argument = if argument.is_finite() && argument > 1.0 {
        argument
    } else {
        1.0
    };
    random_factor * argument.ln()
}

/// Activity-participation utility for a regular user.
///
/// Returns `None` for agents that are not regular users.
pub fn activity_utility(agent: &Agent, price: f64) -> Option<f64> {
    match agent.kind {
        AgentKind::Regular(params) => Some(clamped_log_utility(
            params.random_factor,
            1.0 + 2.0 * agent.tokens + agent.cash + agent.tokens * price,
        )),
        AgentKind::Speculator(_) | AgentKind::Brand(_) | AgentKind::DataPartner(_) => None,
    }
}

/// Buy utility from explicit balances.
pub fn buy_utility(random_factor: f64, tokens: f64, cash: f64, price: f64) -> f64 {
    clamped_log_utility(random_factor, 1.0 + tokens + 2.0 * cash + tokens * price)
}

/// Sell utility from explicit balances.
pub fn sell_utility(random_factor: f64, tokens: f64, cash: f64, price: f64) -> f64 {
    clamped_log_utility(random_factor, 1.0 + 2.0 * tokens + cash + tokens * price)
}

/// A speculator's buy and sell utility at the current price.
///
/// Returns `None` for agents that are not speculators.
pub fn speculator_utilities(agent: &Agent, price: f64) -> Option<(f64, f64)> {
    match agent.kind {
        AgentKind::Speculator(params) => Some((
            buy_utility(params.random_factor, agent.tokens, agent.cash, price),
            sell_utility(params.random_factor, agent.tokens, agent.cash, price),
        )),
        AgentKind::Regular(_) | AgentKind::Brand(_) | AgentKind::DataPartner(_) => None,
    }
}

/// A trade a speculator wants to place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeIntent {
    /// Buy or sell.
    pub side: TradeSide,
    /// Tokens to trade.
    pub amount: f64,
}

/// Decide whether a speculator trades this tick, and how much.
///
/// The speculator buys when buy utility exceeds sell utility and reaches its
/// buy threshold, and sells in the mirror case. The quantity is the amount
/// that would bring the two utility arguments level, `|c - t| / (2 + p)`,
/// capped by the trading limits and by what the agent owns.
pub fn decide_trade(agent: &Agent, price: f64, limits: &TradingConfig) -> Option<TradeIntent> {
    let AgentKind::Speculator(params) = agent.kind else {
        return None;
    };
    let (buy, sell) = speculator_utilities(agent, price)?;
    let side = choose_side(&params, buy, sell)?;

    let equalizing = (agent.cash - agent.tokens).abs() / (2.0 + price);
    let amount = match side {
        TradeSide::Buy => {
            if price <= 0.0 {
                return None;
            }
            let cash_cap = (limits.max_cash_fraction * agent.cash).min(limits.max_trade_cash);
            equalizing.min(cash_cap.max(0.0) / price)
        }
        TradeSide::Sell => equalizing.min(limits.max_token_fraction * agent.tokens),
    };

    (amount.is_finite() && amount > 0.0).then_some(TradeIntent { side, amount })
}

fn choose_side(params: &SpeculatorParams, buy: f64, sell: f64) -> Option<TradeSide> {
    if buy > sell && buy >= params.buy_threshold {
        Some(TradeSide::Buy)
    } else if sell > buy && sell >= params.sell_threshold {
        Some(TradeSide::Sell)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use tokenomy_types::AgentId;

    use super::*;
    use crate::agent::RegularParams;

    fn speculator(cash: f64, tokens: f64, threshold: f64) -> Agent {
        let mut agent = Agent::new(
            AgentId::from_random_bytes([2; 16]),
            cash,
            AgentKind::Speculator(SpeculatorParams {
                random_factor: 1.0,
                buy_threshold: threshold,
                sell_threshold: threshold,
            }),
        );
        agent.tokens = tokens;
        agent
    }

    #[test]
    fn clamp_keeps_log_defined() {
        assert!(clamped_log_utility(2.0, 0.0).abs() < f64::EPSILON);
        assert!(clamped_log_utility(2.0, -5.0).abs() < f64::EPSILON);
        assert!(clamped_log_utility(2.0, f64::NAN).abs() < f64::EPSILON);
        assert!((clamped_log_utility(2.0, core::f64::consts::E) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn activity_utility_weights_tokens() {
        let mut user = Agent::new(
            AgentId::from_random_bytes([3; 16]),
            1000.0,
            AgentKind::Regular(RegularParams {
                random_factor: 1.0,
                data_utility: 75.0,
                cooldown: 0,
            }),
        );
        let base = activity_utility(&user, 0.01).unwrap_or_default();
        assert!((base - 1001.0_f64.ln()).abs() < 1e-12);
        user.tokens = 100.0;
        let with_tokens = activity_utility(&user, 0.01).unwrap_or_default();
        assert!((with_tokens - 1202.0_f64.ln()).abs() < 1e-12);
        assert!(activity_utility(&speculator(1.0, 0.0, 1.0), 0.01).is_none());
    }

    #[test]
    fn cash_rich_speculator_buys() {
        let agent = speculator(3000.0, 0.0, 5.0);
        let intent = decide_trade(&agent, 0.5, &TradingConfig::default());
        let intent = intent.unwrap_or(TradeIntent {
            side: TradeSide::Sell,
            amount: 0.0,
        });
        assert_eq!(intent.side, TradeSide::Buy);
        // Equalizing quantity 3000 / 2.5 = 1200 tokens = 600 cash, under the
        // 1000 cash cap and the 1500 cash fraction.
        assert!((intent.amount - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn buy_capped_by_trade_cash() {
        let agent = speculator(3000.0, 0.0, 5.0);
        let intent = decide_trade(&agent, 2.0, &TradingConfig::default());
        // Equalizing 750 tokens = 1500 cash, capped to 1000 cash = 500 tokens.
        assert!(intent.is_some_and(|i| (i.amount - 500.0).abs() < 1e-9));
    }

    #[test]
    fn token_rich_speculator_sells_capped_fraction() {
        let agent = speculator(0.0, 10_000.0, 5.0);
        let intent = decide_trade(&agent, 0.01, &TradingConfig::default());
        assert!(intent.is_some_and(|i| i.side == TradeSide::Sell));
        // Equalizing 10000 / 2.01 ~ 4975 tokens, under the 5000 token cap.
        assert!(intent.is_some_and(|i| (i.amount - 10_000.0 / 2.01).abs() < 1e-6));
    }

    #[test]
    fn threshold_blocks_trade() {
        let agent = speculator(3000.0, 0.0, 100.0);
        assert!(decide_trade(&agent, 0.5, &TradingConfig::default()).is_none());
    }

    #[test]
    fn balanced_speculator_holds() {
        let agent = speculator(0.0, 0.0, 0.0);
        assert!(decide_trade(&agent, 0.5, &TradingConfig::default()).is_none());
    }
}
