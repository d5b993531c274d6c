//! Resource consumption and replenishment.
//!
//! Operations on a resource the agent does not carry are defined so that
//! action dispatch never needs to special-case kinds: consuming is a
//! successful no-op, replenishing reports `false`. Stored amounts never go
//! below zero.

use crisis_types::{AgentKind, Resource};
use tracing::trace;

use crate::agent::Agent;

/// Whether `kind` may carry `resource` at all.
///
/// Water and tools are truck-only. Battery is generic.
pub const fn uses(kind: AgentKind, resource: Resource) -> bool {
    match resource {
        Resource::Battery => true,
        Resource::Water | Resource::Tools => matches!(kind, AgentKind::Truck),
    }
}

/// Whether `kind` carries `resource` without being configured to.
pub const fn default_carries(kind: AgentKind, resource: Resource) -> bool {
    matches!(
        (kind, resource),
        (AgentKind::Drone, Resource::Battery)
            | (AgentKind::Truck, Resource::Water | Resource::Tools)
    )
}

/// Spend `amount` of `resource`.
///
/// The stored amount is clamped at zero. Returns whether a usable (> 0)
/// amount remains afterward. An agent that does not carry the resource is
/// unaffected and the call reports `true`.
pub fn consume(agent: &mut Agent, resource: Resource, amount: u32) -> bool {
    let id = agent.id().clone();
    let Some(gauge) = agent.gauge_mut(resource) else {
        return true;
    };
    gauge.drain(amount);
    trace!(agent = %id, %resource, left = gauge.current(), "resource consumed");
    gauge.current() > 0
}

/// Refill `resource` to the agent's maximum.
///
/// Returns `false` when the agent does not carry the resource or its kind
/// never uses it.
pub fn replenish(agent: &mut Agent, resource: Resource) -> bool {
    if !uses(agent.kind(), resource) {
        return false;
    }
    let Some(gauge) = agent.gauge_mut(resource) else {
        return false;
    };
    gauge.refill();
    true
}

/// Whether the agent can spend at least one unit of `resource`.
///
/// Agents that do not carry the resource are never blocked by it.
pub fn has_available(agent: &Agent, resource: Resource) -> bool {
    agent.gauge(resource).is_none_or(|g| g.current() > 0)
}
