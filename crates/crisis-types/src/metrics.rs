//! End-of-run metrics.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Aggregate counters for one run.
///
/// `avg_rescue_time` is measured in ticks from spawn to delivery.
/// `success_rate` is a percentage of all survivors that were rescued.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MetricsReport {
    /// Survivors delivered to a hospital.
    pub rescued: u32,
    /// Survivors whose deadline expired.
    pub deaths: u32,
    /// Mean ticks from spawn to delivery, 0 when nobody was rescued.
    pub avg_rescue_time: f64,
    /// Fires put out by trucks.
    pub fires_extinguished: u32,
    /// Rubble cells cleared by trucks.
    pub roads_cleared: u32,
    /// Successful moves across all agents.
    pub energy_used: u32,
    /// Successfully executed `act` commands.
    pub tool_calls: u32,
    /// Planner responses that failed extraction or validation.
    pub invalid_json: u32,
    /// Extra planner calls made after an invalid response.
    pub replans: u32,
    /// Admissions deferred to a hospital queue.
    pub hospital_overflow_events: u32,
    /// Commands rejected while applying a plan.
    pub invalid_commands: u32,
    /// Ticks elapsed.
    pub ticks: u64,
    /// Survivors that existed during the run, including scheduled spawns.
    pub total_survivors: u32,
    /// `rescued / total_survivors` as a percentage.
    pub success_rate: f64,
}
