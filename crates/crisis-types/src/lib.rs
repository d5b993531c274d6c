//! Shared type definitions for the `CrisisSim` disaster-response simulation.
//!
//! This crate is the single source of truth for the values that cross crate
//! and process boundaries: planner payloads, state snapshots, metrics.
//! Observer-facing types flow to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Run, agent, and survivor identifiers
//! - [`enums`] -- Agent kinds, actions, statuses, policies
//! - [`geometry`] -- Grid positions
//! - [`plan`] -- Plan and command payloads
//! - [`snapshot`] -- Planner-visible world projection
//! - [`metrics`] -- End-of-run counters

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod metrics;
pub mod plan;
pub mod snapshot;

pub use enums::{
    ActionName, AgentKind, RejectionReason, Resource, SimulationStatus, SurvivorStatus,
    TriagePolicy,
};
pub use geometry::Position;
pub use ids::{AgentId, BatchId, RunId, SurvivorId};
pub use metrics::MetricsReport;
pub use plan::{Command, CommandKind, Plan};
pub use snapshot::{AgentView, HospitalView, StateSnapshot, SurvivorView};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for observer clients.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::RunId::export_all();
        let _ = crate::ids::BatchId::export_all();
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::SurvivorId::export_all();

        let _ = crate::enums::AgentKind::export_all();
        let _ = crate::enums::Resource::export_all();
        let _ = crate::enums::ActionName::export_all();
        let _ = crate::enums::RejectionReason::export_all();
        let _ = crate::enums::SurvivorStatus::export_all();
        let _ = crate::enums::TriagePolicy::export_all();
        let _ = crate::enums::SimulationStatus::export_all();

        let _ = crate::geometry::Position::export_all();
        let _ = crate::snapshot::StateSnapshot::export_all();
        let _ = crate::snapshot::AgentView::export_all();
        let _ = crate::snapshot::HospitalView::export_all();
        let _ = crate::snapshot::SurvivorView::export_all();
        let _ = crate::metrics::MetricsReport::export_all();
    }
}
