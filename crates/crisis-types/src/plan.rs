//! Plan and command types: the payload a strategy submits each tick.
//!
//! The JSON shape is fixed:
//!
//! ```json
//! {"commands": [
//!   {"agent_id": "m1", "type": "move", "to": [3, 4]},
//!   {"agent_id": "m1", "type": "act", "action_name": "pickup_survivor"}
//! ]}
//! ```
//!
//! Values of these types are only ever built by the command validator or by
//! trusted code, so a `Plan` in hand is always schema-valid. Bounds and
//! capability checks still happen when the plan is applied.

use serde::{Deserialize, Serialize};

use crate::enums::ActionName;
use crate::geometry::Position;
use crate::ids::AgentId;

/// An ordered list of commands applied within a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Commands in application order.
    pub commands: Vec<Command>,
}

impl Plan {
    /// The canonical safe plan: no commands.
    pub const fn empty() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Build a plan from a list of commands.
    pub const fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Whether the plan has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

/// A single instruction addressed to one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// The agent this command is addressed to.
    pub agent_id: AgentId,
    /// What the agent should do.
    #[serde(flatten)]
    pub kind: CommandKind,
}

impl Command {
    /// Build a `move` command.
    pub fn move_to(agent_id: impl Into<String>, to: Position) -> Self {
        Self {
            agent_id: AgentId::new(agent_id),
            kind: CommandKind::Move { to },
        }
    }

    /// Build an `act` command.
    pub fn act(agent_id: impl Into<String>, action_name: ActionName) -> Self {
        Self {
            agent_id: AgentId::new(agent_id),
            kind: CommandKind::Act { action_name },
        }
    }
}

/// The two command shapes, tagged by the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandKind {
    /// Relocate toward `to`.
    Move {
        /// Destination cell.
        to: Position,
    },
    /// Perform an action at the agent's current location.
    Act {
        /// Which action.
        action_name: ActionName,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_shape() {
        let plan = Plan::new(vec![
            Command::move_to("m1", Position::new(3, 4)),
            Command::act("t1", ActionName::ClearRubble),
        ]);
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"commands": [
                {"agent_id": "m1", "type": "move", "to": [3, 4]},
                {"agent_id": "t1", "type": "act", "action_name": "clear_rubble"}
            ]})
        );
    }

    #[test]
    fn empty_plan_serializes_to_empty_commands() {
        let json = serde_json::to_string(&Plan::empty()).unwrap();
        assert_eq!(json, r#"{"commands":[]}"#);
    }
}
