//! World state: the single owner of everything a run mutates.
//!
//! [`WorldState::new`] validates the scenario and fails fast on anything
//! that would leave the world corrupt (non-positive grid, bedless hospital,
//! duplicate agent ids, entities off the grid, survivors with no time left).
//! A scenario without any survivor is already resolved and starts terminated. After construction the
//! world changes only through [`WorldState::apply`] (see [`crate::tick`])
//! and the plan-attempt bookkeeping in [`WorldState::record_plan_attempts`].

use std::collections::BTreeSet;

use crisis_agents::{Agent, AgentError};
use crisis_types::{
    AgentId, MetricsReport, Position, RunId, SimulationStatus, StateSnapshot, SurvivorId,
    SurvivorStatus, SurvivorView,
};
use crisis_world::{FireSpread, Grid, Hospital, WorldError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::clock::{ClockError, SimulationClock};
use crate::config::{MovementMode, ScheduledSpawnConfig, SimulationConfig};
use crate::metrics::Metrics;

/// Errors raised while building a world from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Grid or hospital geometry is invalid.
    #[error("invalid world geometry: {source}")]
    World {
        /// The underlying geometry error.
        #[from]
        source: WorldError,
    },

    /// An agent could not be built.
    #[error("invalid agent: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The tick ceiling is invalid.
    #[error("invalid clock: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Two agents share an id.
    #[error("duplicate agent id: {id}")]
    DuplicateAgent {
        /// The repeated id.
        id: AgentId,
    },

    /// Random survivor deadlines have `min > max`.
    #[error("random survivor deadline range is empty ({min} > {max})")]
    EmptyDeadlineRange {
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },

    /// A placed or scheduled survivor would start with no time left.
    #[error("{group} survivor {index} has a zero deadline")]
    ZeroDeadline {
        /// `placed` or `scheduled`.
        group: &'static str,
        /// Position of the entry in its list.
        index: usize,
    },

    /// Random survivor deadlines may be drawn as zero.
    #[error("random survivor deadlines must start at 1, got min_deadline 0")]
    ZeroMinDeadline,

    /// Not enough free cells for the requested random survivors.
    #[error("no free cell left for random survivor {placed} of {requested}")]
    NoFreeCell {
        /// Survivors placed before running out.
        placed: u32,
        /// Survivors requested.
        requested: u32,
    },
}

/// A person waiting for rescue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survivor {
    id: SurvivorId,
    /// Current cell. Follows the medic while carried.
    pub pos: Position,
    deadline: u32,
    status: SurvivorStatus,
    spawned_at: u64,
    rescued_at: Option<u64>,
}

impl Survivor {
    /// Survivor id.
    pub const fn id(&self) -> SurvivorId {
        self.id
    }

    /// Ticks left before death.
    pub const fn deadline(&self) -> u32 {
        self.deadline
    }

    /// Lifecycle status.
    pub const fn status(&self) -> SurvivorStatus {
        self.status
    }

    /// Tick at which the survivor appeared.
    pub const fn spawned_at(&self) -> u64 {
        self.spawned_at
    }

    /// Tick at which the survivor was delivered, if rescued.
    pub const fn rescued_at(&self) -> Option<u64> {
        self.rescued_at
    }

    /// Move to `next` if the transition is legal. Returns whether it was.
    pub(crate) const fn transition(&mut self, next: SurvivorStatus) -> bool {
        if self.status.can_become(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    /// Mark the survivor delivered at tick `now`.
    pub(crate) const fn rescue(&mut self, now: u64) -> bool {
        if self.transition(SurvivorStatus::Rescued) {
            self.rescued_at = Some(now);
            true
        } else {
            false
        }
    }

    /// Count down one tick. Returns `true` if the survivor just died.
    pub(crate) const fn tick_deadline(&mut self) -> bool {
        if !matches!(self.status, SurvivorStatus::Waiting | SurvivorStatus::Carried) {
            return false;
        }
        self.deadline = self.deadline.saturating_sub(1);
        self.deadline == 0 && self.transition(SurvivorStatus::Dead)
    }
}

/// Complete mutable state of one run.
#[derive(Debug, Clone)]
pub struct WorldState {
    pub(crate) run_id: RunId,
    pub(crate) name: String,
    pub(crate) grid: Grid,
    pub(crate) depot: Position,
    pub(crate) movement: MovementMode,
    pub(crate) clock: SimulationClock,
    pub(crate) agents: Vec<Agent>,
    pub(crate) survivors: Vec<Survivor>,
    pub(crate) hospitals: Vec<Hospital>,
    pub(crate) fires: BTreeSet<Position>,
    pub(crate) rubble: BTreeSet<Position>,
    pub(crate) pending_spawns: Vec<ScheduledSpawnConfig>,
    pub(crate) fire_spread: FireSpread,
    pub(crate) treatment_ticks: u64,
    pub(crate) metrics: Metrics,
    next_survivor_id: u32,
}

impl WorldState {
    /// Build a world from configuration.
    ///
    /// Random survivor placement draws from a [`StdRng`] seeded with
    /// `world.seed`, so the same configuration always yields the same
    /// starting map.
    pub fn new(config: &SimulationConfig) -> Result<Self, SetupError> {
        let grid = Grid::new(config.world.width, config.world.height)?;
        grid.require("depot", config.world.depot)?;

        let mut seen = BTreeSet::new();
        let mut agents = Vec::with_capacity(config.agents.roster.len());
        for params in &config.agents.roster {
            if !seen.insert(params.id.clone()) {
                return Err(SetupError::DuplicateAgent {
                    id: params.id.clone(),
                });
            }
            grid.require(&format!("agent {}", params.id), params.pos)?;
            agents.push(Agent::new(params.clone(), &config.agents.resources)?);
        }

        let mut hospitals = Vec::with_capacity(config.hospitals.len());
        for h in &config.hospitals {
            grid.require("hospital", h.pos)?;
            hospitals.push(Hospital::new(h.pos, h.capacity, config.triage.policy)?);
        }

        for &pos in &config.hazards.initial_fires {
            grid.require("fire", pos)?;
        }
        for &pos in &config.hazards.rubble {
            grid.require("rubble", pos)?;
        }
        for (index, s) in config.survivors.placed.iter().enumerate() {
            grid.require("survivor", s.pos)?;
            if s.deadline == 0 {
                return Err(SetupError::ZeroDeadline {
                    group: "placed",
                    index,
                });
            }
        }
        for (index, s) in config.survivors.scheduled.iter().enumerate() {
            grid.require("scheduled survivor", s.pos)?;
            if s.deadline == 0 {
                return Err(SetupError::ZeroDeadline {
                    group: "scheduled",
                    index,
                });
            }
        }

        let mut pending_spawns = config.survivors.scheduled.clone();
        pending_spawns.sort_by_key(|s| s.tick);

        let mut world = Self {
            run_id: RunId::new(),
            name: config.world.name.clone(),
            grid,
            depot: config.world.depot,
            movement: config.world.movement,
            clock: SimulationClock::new(config.world.max_ticks)?,
            agents,
            survivors: Vec::new(),
            hospitals,
            fires: config.hazards.initial_fires.iter().copied().collect(),
            rubble: config.hazards.rubble.iter().copied().collect(),
            pending_spawns,
            fire_spread: FireSpread::new(
                config.world.seed,
                config.hazards.spread_chance_percent,
                config.hazards.max_fires,
            ),
            treatment_ticks: config.triage.treatment_ticks,
            metrics: Metrics::default(),
            next_survivor_id: 0,
        };

        for s in &config.survivors.placed {
            world.spawn_survivor(s.pos, s.deadline, 0);
        }
        world.place_random_survivors(config)?;
        world.spawn_due(0);
        if world.all_resolved() {
            world.clock.terminate();
            info!(run_id = %world.run_id, "No survivors in scenario, run resolved at tick 0");
        }

        info!(
            run_id = %world.run_id,
            scenario = %world.name,
            width = world.grid.width(),
            height = world.grid.height(),
            agents = world.agents.len(),
            hospitals = world.hospitals.len(),
            survivors = world.survivors.len(),
            scheduled = world.pending_spawns.len(),
            "World initialized"
        );
        Ok(world)
    }

    fn place_random_survivors(&mut self, config: &SimulationConfig) -> Result<(), SetupError> {
        let random = config.survivors.random;
        if random.count == 0 {
            return Ok(());
        }
        if random.min_deadline == 0 {
            return Err(SetupError::ZeroMinDeadline);
        }
        if random.min_deadline > random.max_deadline {
            return Err(SetupError::EmptyDeadlineRange {
                min: random.min_deadline,
                max: random.max_deadline,
            });
        }

        let taken: BTreeSet<Position> = self
            .fires
            .iter()
            .chain(&self.rubble)
            .copied()
            .chain(self.hospitals.iter().map(Hospital::pos))
            .chain(self.survivors.iter().map(|s| s.pos))
            .chain(std::iter::once(self.depot))
            .collect();
        let mut free: Vec<Position> = (0..self.grid.height())
            .flat_map(|y| (0..self.grid.width()).map(move |x| Position::new(x, y)))
            .filter(|p| !taken.contains(p))
            .collect();

        let mut rng = StdRng::seed_from_u64(config.world.seed);
        for placed in 0..random.count {
            if free.is_empty() {
                return Err(SetupError::NoFreeCell {
                    placed,
                    requested: random.count,
                });
            }
            let idx = rng.random_range(0..free.len());
            let pos = free.swap_remove(idx);
            let deadline = rng.random_range(random.min_deadline..=random.max_deadline);
            self.spawn_survivor(pos, deadline, 0);
        }
        Ok(())
    }

    /// Add a waiting survivor that appeared at tick `at`.
    pub(crate) fn spawn_survivor(&mut self, pos: Position, deadline: u32, at: u64) -> SurvivorId {
        let id = SurvivorId(self.next_survivor_id);
        self.next_survivor_id = self.next_survivor_id.saturating_add(1);
        self.survivors.push(Survivor {
            id,
            pos,
            deadline,
            status: SurvivorStatus::Waiting,
            spawned_at: at,
            rescued_at: None,
        });
        id
    }

    /// Spawn every scheduled survivor due at or before `tick`, stamping them
    /// as appearing at `tick`.
    pub(crate) fn spawn_due(&mut self, tick: u64) -> Vec<SurvivorId> {
        let due = self.pending_spawns.partition_point(|s| s.tick <= tick);
        let ready: Vec<ScheduledSpawnConfig> = self.pending_spawns.drain(..due).collect();
        ready
            .into_iter()
            .map(|s| {
                let id = self.spawn_survivor(s.pos, s.deadline, tick);
                debug!(tick, survivor = %id, pos = %s.pos, "Scheduled survivor appeared");
                id
            })
            .collect()
    }

    /// Read-only projection for planners and observers.
    ///
    /// Only waiting survivors are listed; carried, rescued, and dead ones
    /// are not actionable.
    pub fn summarize(&self) -> StateSnapshot {
        StateSnapshot {
            tick: self.clock.tick(),
            width: self.grid.width(),
            height: self.grid.height(),
            depot: self.depot,
            agents: self.agents.iter().map(Agent::view).collect(),
            hospitals: self.hospitals.iter().map(Hospital::view).collect(),
            fires: self.fires.iter().copied().collect(),
            rubble: self.rubble.iter().copied().collect(),
            survivors: self
                .survivors
                .iter()
                .filter(|s| s.status == SurvivorStatus::Waiting)
                .map(|s| SurvivorView {
                    id: s.id,
                    pos: s.pos,
                    deadline: s.deadline,
                })
                .collect(),
        }
    }

    /// Record the cost of obtaining this tick's plan.
    pub fn record_plan_attempts(&mut self, invalid_json: u32, replans: u32) {
        self.metrics.invalid_json = self.metrics.invalid_json.saturating_add(invalid_json);
        self.metrics.replans = self.metrics.replans.saturating_add(replans);
    }

    /// Current metrics as an end-of-run style report.
    pub fn metrics_report(&self) -> MetricsReport {
        let overflow = self
            .hospitals
            .iter()
            .fold(0_u32, |acc, h| acc.saturating_add(h.overflow_events()));
        self.metrics
            .report(self.clock.tick(), self.total_survivors(), overflow)
    }

    /// Survivors that exist or are still scheduled to appear.
    pub fn total_survivors(&self) -> u32 {
        let n = self.survivors.len().saturating_add(self.pending_spawns.len());
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Whether every survivor has been rescued or has died, and no more
    /// are scheduled.
    pub fn all_resolved(&self) -> bool {
        self.pending_spawns.is_empty() && self.survivors.iter().all(|s| s.status.is_resolved())
    }

    /// Cells movement may not enter: rubble and fire.
    pub fn obstacles(&self) -> BTreeSet<Position> {
        self.rubble.union(&self.fires).copied().collect()
    }

    /// Run identifier.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Scenario name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Completed ticks.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Run status.
    pub const fn status(&self) -> SimulationStatus {
        self.clock.status()
    }

    /// Whether more ticks may be applied.
    pub const fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Grid geometry.
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// Depot cell.
    pub const fn depot(&self) -> Position {
        self.depot
    }

    /// Look up an agent.
    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    /// All agents in roster order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// All survivors ever spawned, in spawn order.
    pub fn survivors(&self) -> &[Survivor] {
        &self.survivors
    }

    /// Look up a survivor.
    pub fn survivor(&self, id: SurvivorId) -> Option<&Survivor> {
        self.survivors.iter().find(|s| s.id == id)
    }

    /// All hospitals.
    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    /// Burning cells.
    pub const fn fires(&self) -> &BTreeSet<Position> {
        &self.fires
    }

    /// Rubble cells.
    pub const fn rubble(&self) -> &BTreeSet<Position> {
        &self.rubble
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crisis_agents::AgentParams;
    use crisis_types::AgentKind;

    use super::*;
    use crate::config::{HospitalConfig, SurvivorConfig};

    fn base() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.world.width = 10;
        config.world.height = 10;
        config.agents.roster = vec![
            AgentParams::new("m1", AgentKind::Medic, Position::new(0, 0)),
            AgentParams::new("t1", AgentKind::Truck, Position::new(1, 0)),
        ];
        config.hospitals = vec![HospitalConfig {
            pos: Position::new(9, 9),
            capacity: 2,
        }];
        config
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let mut config = base();
        config.world.width = 0;
        assert!(matches!(WorldState::new(&config), Err(SetupError::World { .. })));
    }

    #[test]
    fn rejects_zero_capacity_hospital() {
        let mut config = base();
        config.hospitals.push(HospitalConfig {
            pos: Position::new(5, 5),
            capacity: 0,
        });
        assert!(matches!(
            WorldState::new(&config),
            Err(SetupError::World {
                source: WorldError::ZeroCapacity { .. }
            })
        ));
    }

    #[test]
    fn rejects_duplicate_agent_ids() {
        let mut config = base();
        config
            .agents
            .roster
            .push(AgentParams::new("m1", AgentKind::Drone, Position::new(2, 2)));
        assert!(matches!(
            WorldState::new(&config),
            Err(SetupError::DuplicateAgent { .. })
        ));
    }

    #[test]
    fn rejects_entities_off_grid() {
        let mut config = base();
        config.hazards.rubble.push(Position::new(10, 3));
        assert!(WorldState::new(&config).is_err());

        let mut config = base();
        config.world.depot = Position::new(-1, 0);
        assert!(WorldState::new(&config).is_err());
    }

    #[test]
    fn rejects_zero_tick_ceiling() {
        let mut config = base();
        config.world.max_ticks = 0;
        assert!(matches!(WorldState::new(&config), Err(SetupError::Clock { .. })));
    }

    #[test]
    fn random_survivors_are_reproducible_and_avoid_obstacles() {
        let mut config = base();
        config.hazards.rubble = vec![Position::new(3, 3)];
        config.survivors.random.count = 15;
        config.survivors.random.min_deadline = 5;
        config.survivors.random.max_deadline = 9;

        let a = WorldState::new(&config).unwrap();
        let b = WorldState::new(&config).unwrap();
        let positions = |w: &WorldState| w.survivors().iter().map(|s| s.pos).collect::<Vec<_>>();
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(a.survivors().len(), 15);
        for s in a.survivors() {
            assert_ne!(s.pos, Position::new(3, 3));
            assert_ne!(s.pos, Position::new(9, 9));
            assert!((5..=9).contains(&s.deadline()));
        }
    }

    #[test]
    fn too_many_random_survivors_fails() {
        let mut config = base();
        config.world.width = 2;
        config.world.height = 1;
        config.agents.roster = vec![AgentParams::new("m1", AgentKind::Medic, Position::new(0, 0))];
        config.hospitals = vec![HospitalConfig {
            pos: Position::new(1, 0),
            capacity: 1,
        }];
        config.survivors.random.count = 1;
        assert!(matches!(
            WorldState::new(&config),
            Err(SetupError::NoFreeCell { .. })
        ));
    }

    #[test]
    fn snapshot_lists_only_kind_resources_and_waiting_survivors() {
        let mut config = base();
        config.survivors.placed = vec![SurvivorConfig {
            pos: Position::new(4, 4),
            deadline: 12,
        }];
        let world = WorldState::new(&config).unwrap();
        let snap = world.summarize();
        assert_eq!(snap.width, 10);
        assert_eq!(snap.agents.len(), 2);
        let medic = snap.agents.first().unwrap();
        assert_eq!(medic.water, None);
        let truck = snap.agents.get(1).unwrap();
        assert_eq!(truck.water, Some(5));
        assert_eq!(snap.survivors.len(), 1);
        assert_eq!(snap.survivors.first().map(|s| s.deadline), Some(12));
        assert_eq!(snap.hospitals.first().map(|h| h.capacity), Some(2));
    }

    #[test]
    fn scheduled_spawns_count_toward_total() {
        let mut config = base();
        config.survivors.scheduled = vec![
            ScheduledSpawnConfig {
                tick: 0,
                pos: Position::new(2, 2),
                deadline: 5,
            },
            ScheduledSpawnConfig {
                tick: 3,
                pos: Position::new(3, 2),
                deadline: 5,
            },
        ];
        let world = WorldState::new(&config).unwrap();
        assert_eq!(world.survivors().len(), 1);
        assert_eq!(world.total_survivors(), 2);
        assert!(!world.all_resolved());
        assert!(world.is_running());
    }

    #[test]
    fn scenario_without_survivors_starts_resolved() {
        let mut world = WorldState::new(&base()).unwrap();
        assert!(world.all_resolved());
        assert_eq!(world.status(), SimulationStatus::Terminated);
        assert_eq!(world.tick(), 0);
        assert!(matches!(
            world.apply(&crisis_types::Plan::empty()),
            Err(crate::tick::TickError::NotRunning { tick: 0 })
        ));
        assert_eq!(world.metrics_report().total_survivors, 0);
    }

    #[test]
    fn only_scheduled_survivors_keep_the_run_open() {
        let mut config = base();
        config.survivors.scheduled = vec![ScheduledSpawnConfig {
            tick: 4,
            pos: Position::new(2, 2),
            deadline: 5,
        }];
        let world = WorldState::new(&config).unwrap();
        assert!(world.survivors().is_empty());
        assert!(world.is_running());
    }

    #[test]
    fn rejects_zero_deadline_survivors() {
        let mut config = base();
        config.survivors.placed = vec![
            SurvivorConfig {
                pos: Position::new(4, 4),
                deadline: 3,
            },
            SurvivorConfig {
                pos: Position::new(5, 4),
                deadline: 0,
            },
        ];
        assert!(matches!(
            WorldState::new(&config),
            Err(SetupError::ZeroDeadline {
                group: "placed",
                index: 1
            })
        ));

        let mut config = base();
        config.survivors.scheduled = vec![ScheduledSpawnConfig {
            tick: 2,
            pos: Position::new(2, 2),
            deadline: 0,
        }];
        assert!(matches!(
            WorldState::new(&config),
            Err(SetupError::ZeroDeadline {
                group: "scheduled",
                index: 0
            })
        ));

        let mut config = base();
        config.survivors.random.count = 2;
        config.survivors.random.min_deadline = 0;
        assert!(matches!(
            WorldState::new(&config),
            Err(SetupError::ZeroMinDeadline)
        ));
    }
}
