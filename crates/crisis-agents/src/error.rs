//! Error types for agent construction.

use crisis_types::{AgentId, AgentKind, Resource};

/// Errors raised while building an agent from configuration.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A resource was configured on a kind that never carries it.
    #[error("agent {agent} is a {kind} and cannot carry {resource}")]
    ResourceNotCarried {
        /// The agent.
        agent: AgentId,
        /// Its kind.
        kind: AgentKind,
        /// The resource it was given.
        resource: Resource,
    },

    /// A starting amount exceeds the configured maximum.
    #[error("agent {agent} starts with {current} {resource}, above its maximum of {max}")]
    AboveMaximum {
        /// The agent.
        agent: AgentId,
        /// The resource.
        resource: Resource,
        /// Starting amount.
        current: u32,
        /// Maximum.
        max: u32,
    },

    /// The agent id is empty.
    #[error("agent id must not be empty")]
    EmptyId,
}
