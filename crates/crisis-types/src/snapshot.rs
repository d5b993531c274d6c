//! Read-only projection of the world handed to planners and observers.
//!
//! Snapshots never expose internal bookkeeping (overflow counters, patient
//! identities, resolved survivors). Resource fields are omitted entirely for
//! agent kinds that do not carry them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::AgentKind;
use crate::geometry::Position;
use crate::ids::{AgentId, SurvivorId};

/// The world as a planner sees it at the start of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateSnapshot {
    /// Current tick number.
    pub tick: u64,
    /// Grid width in cells.
    pub width: i32,
    /// Grid height in cells.
    pub height: i32,
    /// Depot position (recharge and resupply point).
    pub depot: Position,
    /// Every agent.
    pub agents: Vec<AgentView>,
    /// Every hospital.
    pub hospitals: Vec<HospitalView>,
    /// Burning cells.
    pub fires: Vec<Position>,
    /// Cells blocked by rubble.
    pub rubble: Vec<Position>,
    /// Survivors still waiting on the ground.
    pub survivors: Vec<SurvivorView>,
}

/// Planner-visible agent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentView {
    /// Agent id.
    pub id: AgentId,
    /// Agent kind.
    pub kind: AgentKind,
    /// Current cell.
    pub pos: Position,
    /// Battery charge, drones only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub battery: Option<u32>,
    /// Water units, trucks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub water: Option<u32>,
    /// Tool units, trucks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub tools: Option<u32>,
    /// Survivor currently being carried, medics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub carrying: Option<SurvivorId>,
}

/// Planner-visible hospital state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HospitalView {
    /// Hospital cell.
    pub pos: Position,
    /// Number of beds.
    pub capacity: u32,
    /// Occupied beds.
    pub patients: u32,
    /// Survivors waiting for a bed.
    pub queue: u32,
}

/// Planner-visible survivor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SurvivorView {
    /// Survivor id.
    pub id: SurvivorId,
    /// Survivor cell.
    pub pos: Position,
    /// Ticks remaining before the survivor dies.
    pub deadline: u32,
}
