//! Enumeration types shared across the simulation.
//!
//! Every enum that crosses a wire boundary (planner payloads, state
//! snapshots, observer broadcasts) uses `snake_case` serialization so the
//! JSON matches what planners are prompted to produce.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// The role an agent plays. Fixed for the lifetime of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentKind {
    /// Picks up survivors and carries them to hospitals.
    Medic,
    /// Fights fires and clears rubble. Carries water and tools.
    Truck,
    /// Scout with a battery that drains on movement.
    Drone,
}

impl AgentKind {
    /// Lowercase name as it appears in configuration and snapshots.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Medic => "medic",
            Self::Truck => "truck",
            Self::Drone => "drone",
        }
    }
}

impl core::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consumable carried by some agent kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Resource {
    /// Drone battery charge. Spent one unit per move.
    Battery,
    /// Truck water tank. Spent one unit per extinguished fire.
    Water,
    /// Truck tool kit. Spent one unit per cleared rubble cell.
    Tools,
}

impl Resource {
    /// Lowercase name used in logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Battery => "battery",
            Self::Water => "water",
            Self::Tools => "tools",
        }
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// The closed set of actions an `act` command may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionName {
    /// Lift an adjacent waiting survivor.
    PickupSurvivor,
    /// Hand the carried survivor to an adjacent hospital.
    DropAtHospital,
    /// Put out an adjacent fire.
    ExtinguishFire,
    /// Clear an adjacent rubble cell.
    ClearRubble,
    /// Refill battery at the depot.
    Recharge,
    /// Refill water and tools at the depot.
    Resupply,
}

impl ActionName {
    /// Every action, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::PickupSurvivor,
        Self::DropAtHospital,
        Self::ExtinguishFire,
        Self::ClearRubble,
        Self::Recharge,
        Self::Resupply,
    ];

    /// Wire name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PickupSurvivor => "pickup_survivor",
            Self::DropAtHospital => "drop_at_hospital",
            Self::ExtinguishFire => "extinguish_fire",
            Self::ClearRubble => "clear_rubble",
            Self::Recharge => "recharge",
            Self::Resupply => "resupply",
        }
    }

    /// Look up an action by its wire name. Matching is exact.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl core::fmt::Display for ActionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single command was not applied.
///
/// Rejections are local: the command becomes a no-op, the invalid-command
/// metric is incremented, and the rest of the plan continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RejectionReason {
    /// The command names an agent that does not exist.
    UnknownAgent,
    /// The move destination lies outside the grid.
    OutOfBounds,
    /// The move destination is occupied by rubble or fire.
    PathBlocked,
    /// The agent's kind may not perform the action, or no target is in range.
    CapabilityMismatch,
    /// The resource the action needs is at zero.
    ResourceExhausted,
}

impl core::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::UnknownAgent => "unknown agent",
            Self::OutOfBounds => "destination out of bounds",
            Self::PathBlocked => "destination blocked",
            Self::CapabilityMismatch => "capability mismatch",
            Self::ResourceExhausted => "resource exhausted",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Survivors and hospitals
// ---------------------------------------------------------------------------

/// Lifecycle of a survivor.
///
/// Transitions only move forward: `Waiting -> Carried -> Rescued`,
/// `Waiting -> Dead`, `Carried -> Dead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SurvivorStatus {
    /// On the ground, waiting for a medic.
    Waiting,
    /// Being carried by a medic.
    Carried,
    /// Delivered to a hospital.
    Rescued,
    /// Deadline expired before delivery.
    Dead,
}

impl SurvivorStatus {
    /// Whether the survivor no longer needs attention.
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Rescued | Self::Dead)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Carried | Self::Dead) | (Self::Carried, Self::Rescued | Self::Dead)
        )
    }
}

/// Ordering used to promote queued survivors into hospital beds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TriagePolicy {
    /// Earliest queued first.
    #[default]
    Fifo,
    /// Smallest remaining deadline first; earliest queued wins ties.
    Deadline,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SimulationStatus {
    /// Ticks are still being applied.
    #[default]
    Running,
    /// All survivors resolved or the tick ceiling was reached.
    Terminated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_round_trip_through_wire_name() {
        for action in ActionName::ALL {
            assert_eq!(ActionName::from_name(action.as_str()), Some(action));
        }
        assert_eq!(ActionName::from_name("teleport"), None);
        assert_eq!(ActionName::from_name("Recharge"), None);
    }

    #[test]
    fn survivor_transitions_are_forward_only() {
        use SurvivorStatus::{Carried, Dead, Rescued, Waiting};
        assert!(Waiting.can_become(Carried));
        assert!(Waiting.can_become(Dead));
        assert!(Carried.can_become(Rescued));
        assert!(Carried.can_become(Dead));
        assert!(!Waiting.can_become(Rescued));
        assert!(!Rescued.can_become(Waiting));
        assert!(!Dead.can_become(Waiting));
        assert!(!Dead.can_become(Rescued));
    }
}
