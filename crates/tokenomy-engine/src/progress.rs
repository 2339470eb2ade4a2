//! Tick callback that reports monthly progress and keeps recorded events.

use tokenomy_core::{SimulationState, TickCallback, TickSummary};
use tokenomy_types::SimEvent;
use tracing::info;

/// Logs one line per simulated month and collects every tick's events.
#[derive(Debug, Default)]
pub struct ProgressCallback {
    events: Vec<SimEvent>,
}

impl ProgressCallback {
    /// Create a callback with no events.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Events collected so far, in tick order.
    pub fn into_events(self) -> Vec<SimEvent> {
        self.events
    }
}

impl TickCallback for ProgressCallback {
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
        self.events.extend(summary.events.iter().cloned());

        // The clock already points at the next tick.
        if state.clock.is_month_boundary() {
            let snapshot = &summary.snapshot;
            info!(
                month = state.clock.month(),
                tick = summary.tick,
                price = snapshot.price,
                circulating = snapshot.circulating_supply,
                users = snapshot.users,
                speculators = snapshot.speculators,
                burned = state.token.total_burned(),
                "month complete"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokenomy_core::{RunControl, SimulationConfig, run_simulation};

    use super::*;

    #[test]
    fn collects_events_when_recording() {
        let mut config = SimulationConfig::default();
        config.simulation.record_events = true;
        config.population.initial_users = 10;
        config.population.initial_speculators = 10;
        let mut state = SimulationState::new(&config).unwrap();
        let mut callback = ProgressCallback::new();
        run_simulation(&mut state, 3, &RunControl::new(), &mut callback).unwrap();
        let events = callback.into_events();
        let priced = events
            .iter()
            .filter(|e| matches!(e, SimEvent::PriceUpdated { .. }))
            .count();
        assert_eq!(priced, 3);
    }

    #[test]
    fn nothing_collected_without_recording() {
        let mut config = SimulationConfig::default();
        config.population.initial_users = 10;
        config.population.initial_speculators = 10;
        let mut state = SimulationState::new(&config).unwrap();
        let mut callback = ProgressCallback::new();
        run_simulation(&mut state, 2, &RunControl::new(), &mut callback).unwrap();
        assert!(callback.into_events().is_empty());
    }
}
