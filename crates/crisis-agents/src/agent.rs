//! Agent records.
//!
//! An [`Agent`] is built once from [`AgentParams`] and then owned by the
//! world for the whole run. Resource gauges exist only for kinds that use
//! them: drones always get a battery, trucks always get water and tools,
//! and any kind may opt into a battery through configuration. Gauges are
//! private and change only through [`crate::resources`].

use crisis_types::{AgentId, AgentKind, AgentView, Position, Resource, SurvivorId};
use serde::Deserialize;

use crate::config::ResourceConfig;
use crate::error::AgentError;
use crate::resources;

/// Agent description as it appears in scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentParams {
    /// Unique agent id.
    pub id: AgentId,
    /// Agent kind.
    pub kind: AgentKind,
    /// Starting cell.
    pub pos: Position,
    /// Starting battery. Defaults to full for drones.
    #[serde(default)]
    pub battery: Option<u32>,
    /// Battery capacity override.
    #[serde(default)]
    pub max_battery: Option<u32>,
    /// Starting water. Defaults to full for trucks.
    #[serde(default)]
    pub water: Option<u32>,
    /// Water capacity override.
    #[serde(default)]
    pub max_water: Option<u32>,
    /// Starting tools. Defaults to full for trucks.
    #[serde(default)]
    pub tools: Option<u32>,
    /// Tool capacity override.
    #[serde(default)]
    pub max_tools: Option<u32>,
}

impl AgentParams {
    /// Minimal params for an agent of `kind` at `pos` with default resources.
    pub fn new(id: impl Into<String>, kind: AgentKind, pos: Position) -> Self {
        Self {
            id: AgentId::new(id),
            kind,
            pos,
            battery: None,
            max_battery: None,
            water: None,
            max_water: None,
            tools: None,
            max_tools: None,
        }
    }
}

/// A bounded counter: `current` never exceeds `max` and never goes below 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceGauge {
    current: u32,
    max: u32,
}

impl ResourceGauge {
    /// A gauge filled to `max`.
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Remaining amount.
    pub const fn current(self) -> u32 {
        self.current
    }

    /// Capacity.
    pub const fn max(self) -> u32 {
        self.max
    }

    /// Subtract `amount`, stopping at zero.
    pub(crate) const fn drain(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    /// Reset to capacity.
    pub(crate) const fn refill(&mut self) {
        self.current = self.max;
    }
}

/// A field agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    /// Current cell.
    pub pos: Position,
    /// Survivor currently being carried. Only medics ever carry.
    pub carrying: Option<SurvivorId>,
    battery: Option<ResourceGauge>,
    water: Option<ResourceGauge>,
    tools: Option<ResourceGauge>,
}

impl Agent {
    /// Build an agent, applying `defaults` for any unspecified maxima.
    ///
    /// Fails when the id is empty, when a kind is given a resource it never
    /// carries, or when a starting amount exceeds its maximum.
    pub fn new(params: AgentParams, defaults: &ResourceConfig) -> Result<Self, AgentError> {
        if params.id.as_str().is_empty() {
            return Err(AgentError::EmptyId);
        }

        let battery = build_gauge(
            &params,
            Resource::Battery,
            params.battery,
            params.max_battery,
            defaults.max_battery,
        )?;
        let water = build_gauge(
            &params,
            Resource::Water,
            params.water,
            params.max_water,
            defaults.max_water,
        )?;
        let tools = build_gauge(
            &params,
            Resource::Tools,
            params.tools,
            params.max_tools,
            defaults.max_tools,
        )?;

        Ok(Self {
            id: params.id,
            kind: params.kind,
            pos: params.pos,
            carrying: None,
            battery,
            water,
            tools,
        })
    }

    /// Agent id.
    pub const fn id(&self) -> &AgentId {
        &self.id
    }

    /// Agent kind.
    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Gauge for `resource`, if this agent carries it.
    pub const fn gauge(&self, resource: Resource) -> Option<ResourceGauge> {
        match resource {
            Resource::Battery => self.battery,
            Resource::Water => self.water,
            Resource::Tools => self.tools,
        }
    }

    pub(crate) const fn gauge_mut(&mut self, resource: Resource) -> Option<&mut ResourceGauge> {
        match resource {
            Resource::Battery => self.battery.as_mut(),
            Resource::Water => self.water.as_mut(),
            Resource::Tools => self.tools.as_mut(),
        }
    }

    /// Current amount of `resource`, if carried.
    pub fn level(&self, resource: Resource) -> Option<u32> {
        self.gauge(resource).map(ResourceGauge::current)
    }

    /// Planner-visible projection. Only carried resources appear.
    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id.clone(),
            kind: self.kind,
            pos: self.pos,
            battery: self.level(Resource::Battery),
            water: self.level(Resource::Water),
            tools: self.level(Resource::Tools),
            carrying: self.carrying,
        }
    }
}

/// Decide whether the agent carries `resource` and build its gauge.
fn build_gauge(
    params: &AgentParams,
    resource: Resource,
    current: Option<u32>,
    max: Option<u32>,
    default_max: u32,
) -> Result<Option<ResourceGauge>, AgentError> {
    let configured = current.is_some() || max.is_some();
    let carries = resources::default_carries(params.kind, resource)
        || (configured && resources::uses(params.kind, resource));

    if !carries {
        if configured {
            return Err(AgentError::ResourceNotCarried {
                agent: params.id.clone(),
                kind: params.kind,
                resource,
            });
        }
        return Ok(None);
    }

    let max = max.unwrap_or(default_max);
    let current = current.unwrap_or(max);
    if current > max {
        return Err(AgentError::AboveMaximum {
            agent: params.id.clone(),
            resource,
            current,
            max,
        });
    }
    Ok(Some(ResourceGauge { current, max }))
}
