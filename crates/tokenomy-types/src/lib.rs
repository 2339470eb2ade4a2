//! Shared type definitions for the Tokenomy simulation.
//!
//! This crate is the single source of truth for types that cross crate
//! boundaries or leave the simulation core. Types flow downstream to
//! `TypeScript` via `ts-rs` for the reporting layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents, pools, and runs
//! - [`enums`] -- Pool roles, agent classes, activity kinds, trade sides
//! - [`events`] -- Structured per-tick event records
//! - [`structs`] -- Per-tick snapshots and the terminal run summary

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ActivityKind, AgentClass, PoolClass, PoolRole, RejectionReason, TradeSide};
pub use events::{ActivityOutcome, BurnCause, SimEvent};
pub use ids::{AgentId, PoolId, RunId};
pub use structs::{PoolSnapshot, RunSummary, TickSnapshot};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the reporting layer.

    #[test]
    fn export_bindings() {
        // The files are written to the `bindings/` directory relative to
        // the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::PoolId::export_all();
        let _ = crate::ids::RunId::export_all();

        // Enums
        let _ = crate::enums::PoolRole::export_all();
        let _ = crate::enums::PoolClass::export_all();
        let _ = crate::enums::AgentClass::export_all();
        let _ = crate::enums::ActivityKind::export_all();
        let _ = crate::enums::TradeSide::export_all();
        let _ = crate::enums::RejectionReason::export_all();

        // Events
        let _ = crate::events::ActivityOutcome::export_all();
        let _ = crate::events::BurnCause::export_all();
        let _ = crate::events::SimEvent::export_all();

        // Structs
        let _ = crate::structs::PoolSnapshot::export_all();
        let _ = crate::structs::TickSnapshot::export_all();
        let _ = crate::structs::RunSummary::export_all();
    }
}
