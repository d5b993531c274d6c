//! Tick application: the only path by which a plan mutates the world.
//!
//! [`WorldState::apply`] runs two phases:
//!
//! 1. **Commands** -- each command is dispatched in plan order. A command
//!    that fails any check is a local no-op: it is recorded as an invalid
//!    command with a [`RejectionReason`] and the rest of the plan still runs.
//!    `act` commands are checked against the capability table first, then
//!    range (Manhattan distance at most 1), then resources.
//!
//! 2. **World update** -- deadlines count down (expired survivors die and
//!    free their medic), hospitals discharge finished patients and refill
//!    beds from their queues, fire spreads, scheduled survivors appear, and
//!    the clock advances. The run terminates when every survivor is resolved
//!    or the tick ceiling is reached.

use std::collections::BTreeSet;

use crisis_agents::{Agent, capability, resources};
use crisis_types::{
    ActionName, AgentId, CommandKind, Plan, Position, RejectionReason, Resource, SimulationStatus,
    SurvivorId, SurvivorStatus,
};
use crisis_world::{Patient, distance, next_step_toward};
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::ClockError;
use crate::config::MovementMode;
use crate::metrics::bump;
use crate::world::WorldState;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The run already ended; the world was not touched.
    #[error("simulation terminated at tick {tick}")]
    NotRunning {
        /// Tick at which the run ended.
        tick: u64,
    },
}

/// What happened to one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    /// Position of the command in the plan.
    pub index: usize,
    /// Agent the command addressed.
    pub agent_id: AgentId,
    /// Why the command was not applied, or `None` if it was.
    pub rejection: Option<RejectionReason>,
}

impl CommandOutcome {
    /// Whether the command changed the world.
    pub const fn applied(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Result of one [`WorldState::apply`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Tick number after the advance.
    pub tick: u64,
    /// Per-command outcomes, in plan order.
    pub outcomes: Vec<CommandOutcome>,
    /// Survivors delivered this tick.
    pub rescued: u32,
    /// Survivors that died this tick.
    pub deaths: u32,
    /// Patients discharged from hospitals this tick.
    pub discharged: u32,
    /// Cells that caught fire this tick.
    pub new_fires: Vec<Position>,
    /// Scheduled survivors that appeared this tick.
    pub spawned: Vec<SurvivorId>,
    /// Run status after the tick.
    pub status: SimulationStatus,
}

impl TickSummary {
    /// Outcomes that were rejected.
    pub fn rejections(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| !o.applied())
    }
}

type Checked = Result<(), RejectionReason>;

/// Index of the closest candidate within reach of `from`, first seen wins
/// ties.
fn nearest_in_reach<I>(from: Position, candidates: I) -> Option<usize>
where
    I: Iterator<Item = (usize, Position)>,
{
    candidates
        .map(|(i, p)| (i, distance(from, p)))
        .filter(|&(_, d)| d <= 1)
        .min_by_key(|&(_, d)| d)
        .map(|(i, _)| i)
}

fn nearest_cell(from: Position, cells: &BTreeSet<Position>) -> Option<Position> {
    cells
        .iter()
        .copied()
        .filter(|&c| distance(from, c) <= 1)
        .min_by_key(|&c| distance(from, c))
}

fn find_agent<'a>(agents: &'a mut [Agent], id: &AgentId) -> Result<&'a mut Agent, RejectionReason> {
    agents
        .iter_mut()
        .find(|a| a.id() == id)
        .ok_or(RejectionReason::UnknownAgent)
}

/// Spend the capability-table cost of one use of `action`.
fn pay(agent: &mut Agent, action: ActionName) -> Checked {
    let Some(resource) = capability::cost(action) else {
        return Ok(());
    };
    if !resources::has_available(agent, resource) {
        return Err(RejectionReason::ResourceExhausted);
    }
    resources::consume(agent, resource, 1);
    Ok(())
}

impl WorldState {
    /// Apply one plan and advance the clock by one tick.
    ///
    /// Rejected commands never abort the tick. Fails only when the run has
    /// already terminated, in which case nothing is mutated.
    pub fn apply(&mut self, plan: &Plan) -> Result<TickSummary, TickError> {
        if !self.clock.is_running() {
            return Err(TickError::NotRunning {
                tick: self.clock.tick(),
            });
        }
        let now = self.clock.tick();
        let rescued_before = self.metrics.rescued;
        let deaths_before = self.metrics.deaths;

        let mut outcomes = Vec::with_capacity(plan.len());
        for (index, command) in plan.commands.iter().enumerate() {
            let checked = match command.kind {
                CommandKind::Move { to } => self.apply_move(&command.agent_id, to),
                CommandKind::Act { action_name } => {
                    self.apply_act(&command.agent_id, action_name, now)
                }
            };
            let rejection = checked.err();
            if let Some(reason) = rejection {
                bump(&mut self.metrics.invalid_commands);
                debug!(tick = now, index, agent = %command.agent_id, %reason, "Command rejected");
            }
            outcomes.push(CommandOutcome {
                index,
                agent_id: command.agent_id.clone(),
                rejection,
            });
        }

        self.expire_deadlines(now);
        let discharged = self.run_hospitals(now);
        let new_fires = self.spread_fire(now);
        let next = self.clock.advance()?;
        let spawned = self.spawn_due(next);
        if self.all_resolved() {
            self.clock.terminate();
        }

        let summary = TickSummary {
            tick: next,
            outcomes,
            rescued: self.metrics.rescued.saturating_sub(rescued_before),
            deaths: self.metrics.deaths.saturating_sub(deaths_before),
            discharged,
            new_fires,
            spawned,
            status: self.clock.status(),
        };
        info!(
            tick = next,
            commands = summary.outcomes.len(),
            rejected = summary.rejections().count(),
            rescued = summary.rescued,
            deaths = summary.deaths,
            fires = self.fires.len(),
            status = ?summary.status,
            "Tick complete"
        );
        Ok(summary)
    }

    fn apply_move(&mut self, id: &AgentId, to: Position) -> Checked {
        let grid = self.grid;
        let agent = find_agent(&mut self.agents, id)?;
        if !grid.contains(to) {
            return Err(RejectionReason::OutOfBounds);
        }

        let dest = match self.movement {
            MovementMode::Direct => {
                if self.fires.contains(&to) || self.rubble.contains(&to) {
                    return Err(RejectionReason::PathBlocked);
                }
                to
            }
            MovementMode::Step => {
                if agent.pos == to {
                    to
                } else {
                    let obstacles: BTreeSet<Position> =
                        self.rubble.union(&self.fires).copied().collect();
                    let next = next_step_toward(agent.pos, to, &obstacles, grid);
                    if next == agent.pos {
                        return Err(RejectionReason::PathBlocked);
                    }
                    next
                }
            }
        };
        if dest == agent.pos {
            return Ok(());
        }

        if !resources::has_available(agent, Resource::Battery) {
            return Err(RejectionReason::ResourceExhausted);
        }
        resources::consume(agent, Resource::Battery, 1);
        agent.pos = dest;
        if let Some(carried) = agent.carrying
            && let Some(survivor) = self.survivors.iter_mut().find(|s| s.id() == carried)
        {
            survivor.pos = dest;
        }
        bump(&mut self.metrics.energy_used);
        Ok(())
    }

    fn apply_act(&mut self, id: &AgentId, action: ActionName, now: u64) -> Checked {
        let depot = self.depot;
        let agent = find_agent(&mut self.agents, id)?;
        if !capability::can_perform(action, agent.kind()) {
            return Err(RejectionReason::CapabilityMismatch);
        }
        let here = agent.pos;

        match action {
            ActionName::PickupSurvivor => {
                if agent.carrying.is_some() {
                    return Err(RejectionReason::CapabilityMismatch);
                }
                let target = nearest_in_reach(
                    here,
                    self.survivors
                        .iter()
                        .enumerate()
                        .filter(|(_, s)| s.status() == SurvivorStatus::Waiting)
                        .map(|(i, s)| (i, s.pos)),
                )
                .and_then(|i| self.survivors.get_mut(i))
                .ok_or(RejectionReason::CapabilityMismatch)?;
                pay(agent, action)?;
                target.transition(SurvivorStatus::Carried);
                target.pos = here;
                agent.carrying = Some(target.id());
                debug!(tick = now, agent = %id, survivor = %target.id(), "Survivor picked up");
            }
            ActionName::DropAtHospital => {
                let carried = agent.carrying.ok_or(RejectionReason::CapabilityMismatch)?;
                let hospital = nearest_in_reach(
                    here,
                    self.hospitals.iter().map(crisis_world::Hospital::pos).enumerate(),
                )
                .and_then(|i| self.hospitals.get_mut(i))
                .ok_or(RejectionReason::CapabilityMismatch)?;
                pay(agent, action)?;
                agent.carrying = None;
                if let Some(survivor) = self.survivors.iter_mut().find(|s| s.id() == carried)
                    && survivor.rescue(now)
                {
                    survivor.pos = hospital.pos();
                    self.metrics
                        .record_rescue(now.saturating_sub(survivor.spawned_at()));
                    let patient = Patient {
                        survivor: carried,
                        deadline: survivor.deadline(),
                    };
                    hospital.admit(patient, now);
                    hospital.process_queue(now);
                    info!(tick = now, agent = %id, survivor = %carried, hospital = %hospital.pos(), "Survivor rescued");
                }
            }
            ActionName::ExtinguishFire => {
                let fire = nearest_cell(here, &self.fires).ok_or(RejectionReason::CapabilityMismatch)?;
                pay(agent, action)?;
                self.fires.remove(&fire);
                bump(&mut self.metrics.fires_extinguished);
            }
            ActionName::ClearRubble => {
                let rubble =
                    nearest_cell(here, &self.rubble).ok_or(RejectionReason::CapabilityMismatch)?;
                pay(agent, action)?;
                self.rubble.remove(&rubble);
                bump(&mut self.metrics.roads_cleared);
            }
            ActionName::Recharge => {
                if distance(here, depot) > 1 {
                    return Err(RejectionReason::CapabilityMismatch);
                }
                pay(agent, action)?;
                if !resources::replenish(agent, Resource::Battery) {
                    return Err(RejectionReason::CapabilityMismatch);
                }
            }
            ActionName::Resupply => {
                if distance(here, depot) > 1 {
                    return Err(RejectionReason::CapabilityMismatch);
                }
                pay(agent, action)?;
                let water = resources::replenish(agent, Resource::Water);
                let tools = resources::replenish(agent, Resource::Tools);
                if !water && !tools {
                    return Err(RejectionReason::CapabilityMismatch);
                }
            }
        }
        bump(&mut self.metrics.tool_calls);
        Ok(())
    }

    fn expire_deadlines(&mut self, now: u64) {
        for survivor in &mut self.survivors {
            if !survivor.tick_deadline() {
                continue;
            }
            bump(&mut self.metrics.deaths);
            let id = survivor.id();
            for agent in &mut self.agents {
                if agent.carrying == Some(id) {
                    agent.carrying = None;
                }
            }
            info!(tick = now, survivor = %id, pos = %survivor.pos, "Survivor died");
        }
    }

    fn run_hospitals(&mut self, now: u64) -> u32 {
        let mut discharged: usize = 0;
        for hospital in &mut self.hospitals {
            let finished = hospital.discharge_finished(now, self.treatment_ticks);
            discharged = discharged.saturating_add(finished.len());
            hospital.process_queue(now);
        }
        u32::try_from(discharged).unwrap_or(u32::MAX)
    }

    fn spread_fire(&mut self, now: u64) -> Vec<Position> {
        let protected: BTreeSet<Position> = self
            .rubble
            .iter()
            .copied()
            .chain(self.hospitals.iter().map(crisis_world::Hospital::pos))
            .chain(std::iter::once(self.depot))
            .collect();
        let ignited = self
            .fire_spread
            .spread(now, &self.fires, &protected, self.grid);
        self.fires.extend(ignited.iter().copied());
        ignited
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crisis_agents::AgentParams;
    use crisis_types::{AgentKind, Command, TriagePolicy};

    use super::*;
    use crate::config::{HospitalConfig, SimulationConfig, SurvivorConfig};

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.world.width = 8;
        config.world.height = 8;
        config.world.depot = Position::new(0, 0);
        config.agents.roster = vec![
            AgentParams::new("1", AgentKind::Medic, Position::new(2, 2)),
            AgentParams::new("2", AgentKind::Truck, Position::new(5, 5)),
            AgentParams::new("3", AgentKind::Drone, Position::new(1, 0)),
        ];
        config.hospitals = vec![HospitalConfig {
            pos: Position::new(2, 4),
            capacity: 1,
        }];
        config.survivors.placed = vec![SurvivorConfig {
            pos: Position::new(2, 3),
            deadline: 30,
        }];
        config.hazards.initial_fires = vec![Position::new(5, 6)];
        config.hazards.rubble = vec![Position::new(6, 5)];
        config
    }

    fn world() -> WorldState {
        WorldState::new(&config()).unwrap()
    }

    fn plan(commands: Vec<Command>) -> Plan {
        Plan::new(commands)
    }

    fn rejection(summary: &TickSummary, index: usize) -> Option<RejectionReason> {
        summary.outcomes.get(index).and_then(|o| o.rejection)
    }

    #[test]
    fn unknown_agent_and_out_of_bounds_are_no_ops() {
        let mut w = world();
        let before = w.summarize();
        let summary = w
            .apply(&plan(vec![
                Command::move_to("9", Position::new(1, 1)),
                Command::move_to("1", Position::new(999, 999)),
            ]))
            .unwrap();
        assert_eq!(rejection(&summary, 0), Some(RejectionReason::UnknownAgent));
        assert_eq!(rejection(&summary, 1), Some(RejectionReason::OutOfBounds));
        assert_eq!(w.summarize().agents, before.agents);
        assert_eq!(w.metrics_report().invalid_commands, 2);
    }

    #[test]
    fn direct_move_blocked_by_obstacles() {
        let mut w = world();
        let summary = w
            .apply(&plan(vec![
                Command::move_to("2", Position::new(5, 6)),
                Command::move_to("2", Position::new(4, 4)),
            ]))
            .unwrap();
        assert_eq!(rejection(&summary, 0), Some(RejectionReason::PathBlocked));
        assert_eq!(rejection(&summary, 1), None);
        assert_eq!(w.agent(&AgentId::new("2")).unwrap().pos, Position::new(4, 4));
        assert_eq!(w.metrics_report().energy_used, 1);
    }

    #[test]
    fn step_mode_advances_one_cell() {
        let mut c = config();
        c.world.movement = MovementMode::Step;
        let mut w = WorldState::new(&c).unwrap();
        w.apply(&plan(vec![Command::move_to("1", Position::new(2, 7))]))
            .unwrap();
        // (2,3) holds a survivor, not an obstacle.
        assert_eq!(w.agent(&AgentId::new("1")).unwrap().pos, Position::new(2, 3));
    }

    #[test]
    fn drone_battery_drains_and_recharges() {
        let mut c = config();
        c.agents.roster = vec![AgentParams {
            battery: Some(1),
            ..AgentParams::new("3", AgentKind::Drone, Position::new(1, 0))
        }];
        let mut w = WorldState::new(&c).unwrap();
        let summary = w
            .apply(&plan(vec![
                Command::move_to("3", Position::new(0, 1)),
                Command::move_to("3", Position::new(0, 2)),
            ]))
            .unwrap();
        assert_eq!(rejection(&summary, 0), None);
        assert_eq!(rejection(&summary, 1), Some(RejectionReason::ResourceExhausted));

        let summary = w
            .apply(&plan(vec![Command::act("3", ActionName::Recharge)]))
            .unwrap();
        assert_eq!(rejection(&summary, 0), None);
        assert_eq!(
            w.agent(&AgentId::new("3")).unwrap().level(Resource::Battery),
            Some(100)
        );
    }

    #[test]
    fn capability_is_checked_before_range() {
        let mut w = world();
        let summary = w
            .apply(&plan(vec![
                Command::act("2", ActionName::PickupSurvivor),
                Command::act("1", ActionName::ExtinguishFire),
                Command::act("1", ActionName::DropAtHospital),
            ]))
            .unwrap();
        for i in 0..3 {
            assert_eq!(rejection(&summary, i), Some(RejectionReason::CapabilityMismatch));
        }
        assert_eq!(w.metrics_report().tool_calls, 0);
    }

    #[test]
    fn pickup_carry_and_drop() {
        let mut w = world();
        let summary = w
            .apply(&plan(vec![
                Command::act("1", ActionName::PickupSurvivor),
                Command::act("1", ActionName::PickupSurvivor),
                Command::move_to("1", Position::new(2, 3)),
            ]))
            .unwrap();
        assert_eq!(rejection(&summary, 0), None);
        assert_eq!(rejection(&summary, 1), Some(RejectionReason::CapabilityMismatch));
        let s = w.survivor(SurvivorId(0)).unwrap();
        assert_eq!(s.status(), SurvivorStatus::Carried);
        assert_eq!(s.pos, Position::new(2, 3));
        assert!(w.summarize().survivors.is_empty());

        let summary = w
            .apply(&plan(vec![Command::act("1", ActionName::DropAtHospital)]))
            .unwrap();
        assert_eq!(summary.rescued, 1);
        assert_eq!(summary.status, SimulationStatus::Terminated);
        let s = w.survivor(SurvivorId(0)).unwrap();
        assert_eq!(s.status(), SurvivorStatus::Rescued);
        assert_eq!(s.rescued_at(), Some(1));
        assert_eq!(w.hospitals().first().unwrap().patient_count(), 1);
        assert!(w.agent(&AgentId::new("1")).unwrap().carrying.is_none());
        let report = w.metrics_report();
        assert_eq!(report.rescued, 1);
        assert!((report.avg_rescue_time - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.tool_calls, 2);
    }

    #[test]
    fn truck_spends_water_and_tools() {
        let mut w = world();
        let summary = w
            .apply(&plan(vec![
                Command::act("2", ActionName::ExtinguishFire),
                Command::act("2", ActionName::ClearRubble),
                Command::act("2", ActionName::ExtinguishFire),
                Command::act("2", ActionName::Resupply),
            ]))
            .unwrap();
        assert_eq!(rejection(&summary, 0), None);
        assert_eq!(rejection(&summary, 1), None);
        assert_eq!(rejection(&summary, 2), Some(RejectionReason::CapabilityMismatch));
        assert_eq!(rejection(&summary, 3), Some(RejectionReason::CapabilityMismatch));
        assert!(w.fires().is_empty());
        assert!(w.rubble().is_empty());
        let truck = w.agent(&AgentId::new("2")).unwrap();
        assert_eq!(truck.level(Resource::Water), Some(4));
        assert_eq!(truck.level(Resource::Tools), Some(2));
        let report = w.metrics_report();
        assert_eq!(report.fires_extinguished, 1);
        assert_eq!(report.roads_cleared, 1);
    }

    #[test]
    fn empty_water_is_resource_exhausted() {
        let mut c = config();
        c.agents.roster = vec![AgentParams {
            water: Some(0),
            ..AgentParams::new("2", AgentKind::Truck, Position::new(5, 5))
        }];
        let mut w = WorldState::new(&c).unwrap();
        let summary = w
            .apply(&plan(vec![Command::act("2", ActionName::ExtinguishFire)]))
            .unwrap();
        assert_eq!(rejection(&summary, 0), Some(RejectionReason::ResourceExhausted));
        assert_eq!(w.fires().len(), 1);
    }

    #[test]
    fn act_spends_exactly_the_table_cost() {
        for (action, target) in [
            (ActionName::ExtinguishFire, Position::new(5, 6)),
            (ActionName::ClearRubble, Position::new(6, 5)),
        ] {
            let mut w = world();
            let before = w.agent(&AgentId::new("2")).unwrap().clone();
            let summary = w.apply(&plan(vec![Command::act("2", action)])).unwrap();
            assert_eq!(rejection(&summary, 0), None, "{action} at {target}");
            let after = w.agent(&AgentId::new("2")).unwrap();
            let spent = capability::cost(action).unwrap();
            for resource in [Resource::Water, Resource::Tools, Resource::Battery] {
                let expected = if resource == spent {
                    before.level(resource).map(|v| v.saturating_sub(1))
                } else {
                    before.level(resource)
                };
                assert_eq!(after.level(resource), expected, "{action} {resource}");
            }
        }
    }

    #[test]
    fn empty_tools_leave_rubble_in_place() {
        let mut c = config();
        c.agents.roster = vec![AgentParams {
            tools: Some(0),
            ..AgentParams::new("2", AgentKind::Truck, Position::new(5, 5))
        }];
        let mut w = WorldState::new(&c).unwrap();
        let summary = w
            .apply(&plan(vec![
                Command::act("2", ActionName::ClearRubble),
                Command::act("2", ActionName::ExtinguishFire),
            ]))
            .unwrap();
        assert_eq!(rejection(&summary, 0), Some(RejectionReason::ResourceExhausted));
        assert_eq!(rejection(&summary, 1), None);
        assert_eq!(w.rubble().len(), 1);
        assert_eq!(w.agent(&AgentId::new("2")).unwrap().level(Resource::Tools), Some(0));
    }

    #[test]
    fn deadline_one_dies_after_one_tick() {
        let mut c = config();
        c.survivors.placed = vec![SurvivorConfig {
            pos: Position::new(7, 7),
            deadline: 1,
        }];
        let mut w = WorldState::new(&c).unwrap();
        let summary = w.apply(&Plan::empty()).unwrap();
        assert_eq!(summary.deaths, 1);
        assert_eq!(w.survivor(SurvivorId(0)).unwrap().status(), SurvivorStatus::Dead);
        assert_eq!(summary.status, SimulationStatus::Terminated);
        assert!(matches!(
            w.apply(&Plan::empty()),
            Err(TickError::NotRunning { tick: 1 })
        ));
    }

    #[test]
    fn carried_survivor_death_frees_medic() {
        let mut c = config();
        c.survivors.placed = vec![SurvivorConfig {
            pos: Position::new(2, 3),
            deadline: 1,
        }];
        let mut w = WorldState::new(&c).unwrap();
        w.apply(&plan(vec![Command::act("1", ActionName::PickupSurvivor)]))
            .unwrap();
        assert_eq!(w.survivor(SurvivorId(0)).unwrap().status(), SurvivorStatus::Dead);
        assert!(w.agent(&AgentId::new("1")).unwrap().carrying.is_none());
    }

    #[test]
    fn full_hospital_queues_and_discharges() {
        let mut c = config();
        c.triage.policy = TriagePolicy::Fifo;
        c.triage.treatment_ticks = 2;
        c.survivors.placed = vec![
            SurvivorConfig {
                pos: Position::new(2, 3),
                deadline: 30,
            },
            SurvivorConfig {
                pos: Position::new(1, 2),
                deadline: 30,
            },
            SurvivorConfig {
                pos: Position::new(7, 7),
                deadline: 30,
            },
        ];
        let mut w = WorldState::new(&c).unwrap();
        let pick_and_drop = || {
            plan(vec![
                Command::act("1", ActionName::PickupSurvivor),
                Command::move_to("1", Position::new(2, 3)),
                Command::act("1", ActionName::DropAtHospital),
                Command::move_to("1", Position::new(2, 2)),
            ])
        };
        w.apply(&pick_and_drop()).unwrap();
        w.apply(&pick_and_drop()).unwrap();
        let hospital = w.hospitals().first().unwrap();
        assert_eq!(hospital.patient_count(), 1);
        assert_eq!(hospital.queue_len(), 1);
        assert_eq!(w.metrics_report().hospital_overflow_events, 1);

        let summary = w.apply(&Plan::empty()).unwrap();
        assert_eq!(summary.discharged, 1);
        let hospital = w.hospitals().first().unwrap();
        assert_eq!(hospital.patient_count(), 1);
        assert_eq!(hospital.queue_len(), 0);
    }

    #[test]
    fn ceiling_terminates_run() {
        let mut c = config();
        c.world.max_ticks = 2;
        let mut w = WorldState::new(&c).unwrap();
        w.apply(&Plan::empty()).unwrap();
        assert!(w.is_running());
        let summary = w.apply(&Plan::empty()).unwrap();
        assert_eq!(summary.status, SimulationStatus::Terminated);
        assert_eq!(w.tick(), 2);
    }

    #[test]
    fn scheduled_spawn_appears_at_its_tick() {
        let mut c = config();
        c.survivors.scheduled = vec![crate::config::ScheduledSpawnConfig {
            tick: 2,
            pos: Position::new(6, 1),
            deadline: 9,
        }];
        let mut w = WorldState::new(&c).unwrap();
        assert!(w.apply(&Plan::empty()).unwrap().spawned.is_empty());
        let summary = w.apply(&Plan::empty()).unwrap();
        assert_eq!(summary.spawned, vec![SurvivorId(1)]);
        assert_eq!(w.survivor(SurvivorId(1)).unwrap().spawned_at(), 2);
        assert_eq!(w.summarize().survivors.len(), 2);
    }
}
