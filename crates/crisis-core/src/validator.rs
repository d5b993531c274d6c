//! Command validator: the trust boundary between planner text and the world.
//!
//! Planner output is untrusted free text. Turning it into a [`Plan`] takes
//! two separate passes:
//!
//! 1. **Extraction** ([`extract_payload`]) locates a JSON object inside the
//!    text. Preamble and postamble prose are tolerated. If the slice from
//!    the first `{` to the last `}` does not parse, a fenced code block and
//!    then a trailing-comma cleanup are tried before giving up.
//! 2. **Validation** ([`validate`]) checks the payload against the fixed
//!    command schema and reports the first violation by command index.
//!
//! [`repair`] is a separate best-effort pass that keeps every command it
//! can salvage. It never fails and leaves schema-valid payloads unchanged.

use crisis_types::{ActionName, AgentId, Command, CommandKind, Plan, Position};
use serde_json::{Map, Value};

/// Where in the payload a schema violation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The top-level value.
    Plan,
    /// The command at this zero-based index.
    Command(usize),
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Plan => f.write_str("plan"),
            Self::Command(i) => write!(f, "command {i}"),
        }
    }
}

/// Which schema rule a payload broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaRule {
    /// The value at this location must be a JSON object.
    NotAnObject,
    /// A required field is absent.
    MissingField(&'static str),
    /// `commands` is present but not an array.
    CommandsNotArray,
    /// `agent_id` is neither a string nor an integer.
    InvalidAgentId,
    /// `type` is not `move` or `act`.
    InvalidType,
    /// `to` is not a two-element integer pair.
    InvalidTarget,
    /// `action_name` is not one of the six known actions.
    InvalidActionName,
}

impl core::fmt::Display for SchemaRule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("must be a JSON object"),
            Self::MissingField(field) => write!(f, "missing required field '{field}'"),
            Self::CommandsNotArray => f.write_str("'commands' must be an array"),
            Self::InvalidAgentId => f.write_str("agent_id must be a string or integer"),
            Self::InvalidType => f.write_str("invalid type, expected 'move' or 'act'"),
            Self::InvalidTarget => f.write_str("'to' must be a pair of integers [x, y]"),
            Self::InvalidActionName => f.write_str("invalid action_name"),
        }
    }
}

/// Why planner output could not be turned into a plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// No JSON object could be located or parsed.
    #[error("parse error: {reason}")]
    Parse {
        /// What went wrong.
        reason: String,
    },

    /// The JSON parsed but breaks the command schema.
    #[error("{location}: {rule}")]
    SchemaViolation {
        /// Where the violation is.
        location: Location,
        /// Which rule was broken.
        rule: SchemaRule,
    },
}

impl PlanError {
    const fn schema(location: Location, rule: SchemaRule) -> Self {
        Self::SchemaViolation { location, rule }
    }

    /// Whether this is an extraction failure rather than a schema failure.
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Outcome of [`extract_and_validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlanCheck {
    /// The extracted JSON payload, when extraction succeeded.
    pub payload: Option<Value>,
    /// The validated plan, or why validation failed.
    pub outcome: Result<Plan, PlanError>,
}

impl PlanCheck {
    /// Whether the response produced a schema-valid plan.
    pub const fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The failure, if any.
    pub const fn error(&self) -> Option<&PlanError> {
        match &self.outcome {
            Ok(_) => None,
            Err(e) => Some(e),
        }
    }
}

/// Extract and validate a plan from raw planner output.
pub fn extract_and_validate(raw: &str) -> PlanCheck {
    match extract_payload(raw) {
        Ok(payload) => {
            let outcome = validate(&payload);
            PlanCheck {
                payload: Some(payload),
                outcome,
            }
        }
        Err(err) => PlanCheck {
            payload: None,
            outcome: Err(err),
        },
    }
}

/// Locate and parse the JSON object embedded in `raw`.
///
/// Recovery strategies, in order:
/// 1. First `{` through last `}`
/// 2. The same, restricted to a fenced code block
/// 3. Strategy 1 with trailing commas removed
pub fn extract_payload(raw: &str) -> Result<Value, PlanError> {
    let Some(outer) = brace_span(raw) else {
        return Err(PlanError::Parse {
            reason: "no JSON object found in response".to_owned(),
        });
    };

    let first_err = match serde_json::from_str::<Value>(outer) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(inner) = extract_codeblock(raw).and_then(brace_span)
        && let Ok(value) = serde_json::from_str::<Value>(inner)
    {
        return Ok(value);
    }

    let cleaned = strip_trailing_commas(outer);
    serde_json::from_str::<Value>(&cleaned).map_err(|cleaned_err| PlanError::Parse {
        reason: format!("invalid JSON: {first_err} (after comma cleanup: {cleaned_err})"),
    })
}

/// The slice from the first `{` to the last `}` inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Contents of the first fenced code block, if any.
fn extract_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = fence.checked_add(3)?;
    let rest = text.get(after_fence..)?;
    // Skip the info string (e.g. "json") up to the end of the line.
    let body_start = rest.find('\n').and_then(|nl| nl.checked_add(1)).unwrap_or(0);
    let body = rest.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end)
}

/// Remove commas that directly precede `}` or `]`, leaving string
/// literals untouched.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars.clone().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}

/// Validate an extracted payload against the command schema.
///
/// Stops at the first violation. `agent_id` integers are accepted and
/// converted to their decimal string form.
pub fn validate(payload: &Value) -> Result<Plan, PlanError> {
    let Some(root) = payload.as_object() else {
        return Err(PlanError::schema(Location::Plan, SchemaRule::NotAnObject));
    };
    let Some(commands) = root.get("commands") else {
        return Err(PlanError::schema(
            Location::Plan,
            SchemaRule::MissingField("commands"),
        ));
    };
    let Some(entries) = commands.as_array() else {
        return Err(PlanError::schema(Location::Plan, SchemaRule::CommandsNotArray));
    };

    let mut plan = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let command = validate_command(entry)
            .map_err(|rule| PlanError::schema(Location::Command(index), rule))?;
        plan.push(command);
    }
    Ok(Plan::new(plan))
}

fn validate_command(entry: &Value) -> Result<Command, SchemaRule> {
    let obj = entry.as_object().ok_or(SchemaRule::NotAnObject)?;
    let agent_id = obj
        .get("agent_id")
        .ok_or(SchemaRule::MissingField("agent_id"))?;
    let kind = obj.get("type").ok_or(SchemaRule::MissingField("type"))?;
    let agent_id = strict_agent_id(agent_id).ok_or(SchemaRule::InvalidAgentId)?;

    let kind = match kind.as_str() {
        Some("move") => {
            let to = obj.get("to").ok_or(SchemaRule::MissingField("to"))?;
            let to = strict_position(to).ok_or(SchemaRule::InvalidTarget)?;
            CommandKind::Move { to }
        }
        Some("act") => {
            let name = obj
                .get("action_name")
                .ok_or(SchemaRule::MissingField("action_name"))?;
            let action_name = name
                .as_str()
                .and_then(ActionName::from_name)
                .ok_or(SchemaRule::InvalidActionName)?;
            CommandKind::Act { action_name }
        }
        _ => return Err(SchemaRule::InvalidType),
    };

    Ok(Command { agent_id, kind })
}

fn strict_agent_id(value: &Value) -> Option<AgentId> {
    match value {
        Value::String(s) => Some(AgentId::new(s.as_str())),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(AgentId::new(n.to_string())),
        _ => None,
    }
}

fn strict_position(value: &Value) -> Option<Position> {
    let [x, y] = value.as_array()?.as_slice() else {
        return None;
    };
    let x = i32::try_from(x.as_i64()?).ok()?;
    let y = i32::try_from(y.as_i64()?).ok()?;
    Some(Position::new(x, y))
}

/// Best-effort salvage of a payload that failed validation.
///
/// Commands missing a required field or carrying an unknown `type` or
/// `action_name` are dropped. `agent_id` values of any scalar type are
/// turned into strings, and coordinates given as floats or numeric strings
/// are truncated to integers. A payload without a `commands` array yields
/// the empty plan. For a schema-valid payload the result equals
/// [`validate`]'s.
pub fn repair(payload: &Value) -> Plan {
    let Some(entries) = payload
        .as_object()
        .and_then(|root| root.get("commands"))
        .and_then(Value::as_array)
    else {
        return Plan::empty();
    };

    Plan::new(
        entries
            .iter()
            .filter_map(Value::as_object)
            .filter_map(repair_command)
            .collect(),
    )
}

fn repair_command(obj: &Map<String, Value>) -> Option<Command> {
    let agent_id = lenient_agent_id(obj.get("agent_id")?)?;
    let kind = match obj.get("type")?.as_str()? {
        "move" => CommandKind::Move {
            to: lenient_position(obj.get("to")?)?,
        },
        "act" => CommandKind::Act {
            action_name: ActionName::from_name(obj.get("action_name")?.as_str()?)?,
        },
        _ => return None,
    };
    Some(Command { agent_id, kind })
}

fn lenient_agent_id(value: &Value) -> Option<AgentId> {
    match value {
        Value::String(s) => Some(AgentId::new(s.as_str())),
        Value::Number(n) => Some(AgentId::new(n.to_string())),
        Value::Bool(b) => Some(AgentId::new(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_position(value: &Value) -> Option<Position> {
    let [x, y] = value.as_array()?.as_slice() else {
        return None;
    };
    Some(Position::new(lenient_coordinate(x)?, lenient_coordinate(y)?))
}

fn lenient_coordinate(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .or_else(|| n.as_f64().and_then(truncate_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_float))
        }
        _ => None,
    }
}

/// Truncate toward zero, rejecting non-finite or out-of-range values.
#[allow(clippy::cast_possible_truncation)]
fn truncate_float(f: f64) -> Option<i32> {
    let t = f.trunc();
    if t.is_finite() && t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX) {
        Some(t as i32)
    } else {
        None
    }
}
