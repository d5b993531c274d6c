//! Strategies the engine can run, and the critique-memory wrapper.
//!
//! [`NearestTargetStrategy`] is the rule-based baseline. It reads only the
//! snapshot: medics walk toward the nearest waiting survivor they can still
//! reach in time, pick them up, and carry them to the nearest hospital.
//! Trucks put out fires and clear rubble, heading to the depot to resupply
//! when empty. Drones go home to recharge when their battery runs low.

use std::collections::BTreeSet;

use crisis_core::decision::{IdleStrategy, PlanRequest, StrategyError, StrategyPort};
use crisis_core::memory::CritiqueMemory;
use crisis_types::{ActionName, AgentKind, AgentView, Command, Plan, Position, StateSnapshot, SurvivorId};
use crisis_world::{Grid, bfs, distance};

use crate::error::EngineError;

/// Environment variable selecting the strategy.
pub const ENV_STRATEGY: &str = "CRISIS_STRATEGY";

/// Battery level at or below which a drone heads home.
const LOW_BATTERY: u32 = 2;

/// Strategies selectable at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrategyKind {
    /// [`NearestTargetStrategy`].
    #[default]
    Nearest,
    /// [`IdleStrategy`].
    Idle,
}

impl StrategyKind {
    /// Read the strategy from `CRISIS_STRATEGY`, defaulting to nearest.
    pub fn from_env() -> Result<Self, EngineError> {
        std::env::var(ENV_STRATEGY)
            .map_or_else(|_| Ok(Self::default()), |name| Self::from_name(&name))
    }

    /// Parse a strategy name.
    pub fn from_name(name: &str) -> Result<Self, EngineError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nearest" | "nearest_target" => Ok(Self::Nearest),
            "idle" => Ok(Self::Idle),
            _ => Err(EngineError::UnknownStrategy {
                name: name.to_owned(),
            }),
        }
    }

    /// Build a fresh instance.
    pub fn build(self) -> Box<dyn StrategyPort> {
        match self {
            Self::Nearest => Box::new(NearestTargetStrategy::new()),
            Self::Idle => Box::new(IdleStrategy::new()),
        }
    }
}

/// Rule-based baseline planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestTargetStrategy;

impl NearestTargetStrategy {
    /// Create the strategy.
    pub const fn new() -> Self {
        Self
    }

    /// Build a plan for `snapshot`, at most one command per agent.
    pub fn plan(snapshot: &StateSnapshot) -> Result<Plan, StrategyError> {
        let grid = Grid::new(snapshot.width, snapshot.height).map_err(|e| {
            StrategyError::Internal {
                message: format!("snapshot grid: {e}"),
            }
        })?;
        let mut planner = Planner {
            snapshot,
            grid,
            obstacles: snapshot.fires.iter().chain(&snapshot.rubble).copied().collect(),
            claimed: BTreeSet::new(),
        };
        let commands = snapshot
            .agents
            .iter()
            .filter_map(|agent| match agent.kind {
                AgentKind::Medic => planner.medic(agent),
                AgentKind::Truck => planner.truck(agent),
                AgentKind::Drone => planner.drone(agent),
            })
            .collect();
        Ok(Plan::new(commands))
    }
}

impl StrategyPort for NearestTargetStrategy {
    fn name(&self) -> &str {
        "nearest"
    }

    fn propose(&mut self, request: &PlanRequest<'_>) -> Result<String, StrategyError> {
        let plan = Self::plan(request.snapshot)?;
        serde_json::to_string(&plan).map_err(|e| StrategyError::Internal {
            message: format!("plan serialization: {e}"),
        })
    }
}

struct Planner<'a> {
    snapshot: &'a StateSnapshot,
    grid: Grid,
    obstacles: BTreeSet<Position>,
    claimed: BTreeSet<SurvivorId>,
}

impl Planner<'_> {
    /// Shortest path to `to`, which may itself be an obstacle.
    fn route(&self, from: Position, to: Position) -> Option<Vec<Position>> {
        let path = if self.obstacles.contains(&to) {
            let mut open = self.obstacles.clone();
            open.remove(&to);
            bfs(from, to, &open, self.grid)
        } else {
            bfs(from, to, &self.obstacles, self.grid)
        };
        (!path.is_empty()).then_some(path)
    }

    /// First step along `path`, unless the agent cannot move.
    fn step(&self, agent: &AgentView, path: &[Position]) -> Option<Command> {
        if agent.battery == Some(0) {
            return None;
        }
        path.get(1)
            .filter(|next| !self.obstacles.contains(next))
            .map(|&next| Command::move_to(agent.id.as_str(), next))
    }

    /// Act when within reach of the path's end, otherwise step along it.
    fn approach(&self, agent: &AgentView, path: &[Position], action: ActionName) -> Option<Command> {
        if path.len() <= 2 {
            Some(Command::act(agent.id.as_str(), action))
        } else {
            self.step(agent, path)
        }
    }

    fn nearest_cell(&self, from: Position, cells: &[Position]) -> Option<Vec<Position>> {
        cells
            .iter()
            .filter_map(|&cell| self.route(from, cell))
            .min_by_key(Vec::len)
    }

    fn medic(&mut self, agent: &AgentView) -> Option<Command> {
        if agent.carrying.is_some() {
            let hospitals: Vec<Position> = self.snapshot.hospitals.iter().map(|h| h.pos).collect();
            let path = self.nearest_cell(agent.pos, &hospitals)?;
            return self.approach(agent, &path, ActionName::DropAtHospital);
        }

        // Survivors who would die before the medic arrives rank last.
        let (target, path) = self
            .snapshot
            .survivors
            .iter()
            .filter(|s| !self.claimed.contains(&s.id))
            .filter_map(|s| self.route(agent.pos, s.pos).map(|path| (s, path)))
            .min_by_key(|(s, path)| {
                let steps = path.len().saturating_sub(1);
                let too_late = usize::try_from(s.deadline).is_ok_and(|d| d < steps);
                (too_late, path.len())
            })
            .map(|(s, path)| (s.id, path))?;
        self.claimed.insert(target);
        self.approach(agent, &path, ActionName::PickupSurvivor)
    }

    fn truck(&self, agent: &AgentView) -> Option<Command> {
        let water = agent.water.unwrap_or(0);
        let tools = agent.tools.unwrap_or(0);
        let adjacent = |cells: &[Position]| cells.iter().any(|&c| distance(agent.pos, c) <= 1);

        if water > 0 && adjacent(&self.snapshot.fires) {
            return Some(Command::act(agent.id.as_str(), ActionName::ExtinguishFire));
        }
        if tools > 0 && adjacent(&self.snapshot.rubble) {
            return Some(Command::act(agent.id.as_str(), ActionName::ClearRubble));
        }

        let mut targets: Vec<Position> = Vec::new();
        if water > 0 {
            targets.extend(&self.snapshot.fires);
        }
        if tools > 0 {
            targets.extend(&self.snapshot.rubble);
        }
        if let Some(path) = self.nearest_cell(agent.pos, &targets) {
            return self.step(agent, &path);
        }

        if agent.water == Some(0) || agent.tools == Some(0) {
            let path = self.route(agent.pos, self.snapshot.depot)?;
            return self.approach(agent, &path, ActionName::Resupply);
        }
        None
    }

    fn drone(&self, agent: &AgentView) -> Option<Command> {
        let battery = agent.battery?;
        if battery > LOW_BATTERY {
            return None;
        }
        let path = self.route(agent.pos, self.snapshot.depot)?;
        self.approach(agent, &path, ActionName::Recharge)
    }
}

/// Wraps a strategy and prepends lessons from critique memory to its
/// scratchpad.
///
/// Lessons are read once, when the wrapper is built, so every tick of an
/// episode sees the same lessons.
#[derive(Debug)]
pub struct RememberingStrategy<S> {
    inner: S,
    lessons: Option<String>,
}

impl<S: StrategyPort> RememberingStrategy<S> {
    /// Wrap `inner` with the current contents of `memory`.
    pub fn new(inner: S, memory: &CritiqueMemory) -> Self {
        Self {
            inner,
            lessons: memory.render(),
        }
    }
}

impl<S: StrategyPort> StrategyPort for RememberingStrategy<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn propose(&mut self, request: &PlanRequest<'_>) -> Result<String, StrategyError> {
        let Some(lessons) = &self.lessons else {
            return self.inner.propose(request);
        };
        let scratchpad = if request.scratchpad.is_empty() {
            format!("Lessons from earlier runs:\n{lessons}")
        } else {
            format!(
                "Lessons from earlier runs:\n{lessons}\n\nRecent plans:\n{}",
                request.scratchpad
            )
        };
        let mut forwarded = PlanRequest::new(request.snapshot, &scratchpad);
        if let Some(feedback) = request.feedback {
            forwarded = forwarded.with_feedback(feedback);
        }
        self.inner.propose(&forwarded)
    }
}
