//! Plan acquisition: ask the strategy, validate, retry with feedback, and
//! fall back when the strategy cannot produce a valid plan.

use crisis_types::{Plan, StateSnapshot};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PlanningConfig;
use crate::decision::{PlanRequest, StrategyPort};
use crate::validator::{self, PlanError};

/// Where the plan applied this tick came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// A schema-valid strategy response.
    Strategy,
    /// The last invalid payload, repaired.
    Repaired,
    /// The canonical empty plan.
    Empty,
}

/// Result of [`obtain_plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// The plan to apply.
    pub plan: Plan,
    /// Where the plan came from.
    pub source: PlanSource,
    /// Responses rejected by the validator.
    pub invalid_json: u32,
    /// Extra strategy calls made after a rejection.
    pub replans: u32,
    /// The most recent validation failure, if any.
    pub last_error: Option<PlanError>,
}

impl PlanOutcome {
    const fn fallback(invalid_json: u32, replans: u32, last_error: Option<PlanError>) -> Self {
        Self {
            plan: Plan::empty(),
            source: PlanSource::Empty,
            invalid_json,
            replans,
            last_error,
        }
    }
}

/// Obtain one tick's plan from `strategy`.
///
/// An invalid response is retried up to `config.max_retries` times, each
/// retry carrying the previous [`PlanError`] as feedback. When retries run
/// out the empty plan is used, or the repaired last payload when
/// `config.repair_on_exhaustion` is set. A strategy error ends the attempt
/// immediately with the empty plan.
pub fn obtain_plan<S>(
    strategy: &mut S,
    snapshot: &StateSnapshot,
    scratchpad: &str,
    config: &PlanningConfig,
) -> PlanOutcome
where
    S: StrategyPort + ?Sized,
{
    let mut invalid_json: u32 = 0;
    let mut replans: u32 = 0;
    let mut last_error: Option<PlanError> = None;
    let mut last_payload: Option<Value> = None;

    loop {
        let base = PlanRequest::new(snapshot, scratchpad);
        let request = match &last_error {
            Some(err) => base.with_feedback(err),
            None => base,
        };
        let raw = match strategy.propose(&request) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(tick = snapshot.tick, strategy = strategy.name(), %err, "Strategy failed, using empty plan");
                return PlanOutcome::fallback(invalid_json, replans, last_error);
            }
        };

        let check = validator::extract_and_validate(&raw);
        match check.outcome {
            Ok(plan) => {
                return PlanOutcome {
                    plan,
                    source: PlanSource::Strategy,
                    invalid_json,
                    replans,
                    last_error,
                };
            }
            Err(err) => {
                invalid_json = invalid_json.saturating_add(1);
                debug!(tick = snapshot.tick, attempt = replans, %err, "Plan rejected");
                if check.payload.is_some() {
                    last_payload = check.payload;
                }
                last_error = Some(err);
            }
        }

        if replans >= config.max_retries {
            break;
        }
        replans = replans.saturating_add(1);
    }

    if config.repair_on_exhaustion
        && let Some(payload) = last_payload
    {
        let plan = validator::repair(&payload);
        warn!(
            tick = snapshot.tick,
            commands = plan.len(),
            "Retries exhausted, applying repaired plan"
        );
        return PlanOutcome {
            plan,
            source: PlanSource::Repaired,
            invalid_json,
            replans,
            last_error,
        };
    }

    warn!(tick = snapshot.tick, invalid_json, "Retries exhausted, using empty plan");
    PlanOutcome::fallback(invalid_json, replans, last_error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crisis_types::{ActionName, Command, Position};

    use super::*;
    use crate::decision::{ScriptedStrategy, StrategyError};

    fn snapshot() -> StateSnapshot {
        StateSnapshot {
            tick: 3,
            width: 5,
            height: 5,
            depot: Position::new(0, 0),
            agents: Vec::new(),
            hospitals: Vec::new(),
            fires: Vec::new(),
            rubble: Vec::new(),
            survivors: Vec::new(),
        }
    }

    const VALID: &str = r#"{"commands": [{"agent_id": "1", "type": "act", "action_name": "recharge"}]}"#;
    const BAD_ACTION: &str =
        r#"{"commands": [{"agent_id": 1, "type": "act", "action_name": "fly"}, {"agent_id": 2, "type": "move", "to": [1, 2]}]}"#;

    #[test]
    fn valid_first_response_needs_no_retry() {
        let mut strategy = ScriptedStrategy::new([VALID]);
        let outcome = obtain_plan(&mut strategy, &snapshot(), "", &PlanningConfig::default());
        assert_eq!(outcome.source, PlanSource::Strategy);
        assert_eq!(outcome.plan.commands, vec![Command::act("1", ActionName::Recharge)]);
        assert_eq!((outcome.invalid_json, outcome.replans), (0, 0));
    }

    #[test]
    fn invalid_then_valid_counts_one_replan() {
        let mut strategy = ScriptedStrategy::new(["not json", VALID]);
        let outcome = obtain_plan(&mut strategy, &snapshot(), "", &PlanningConfig::default());
        assert_eq!(outcome.source, PlanSource::Strategy);
        assert_eq!((outcome.invalid_json, outcome.replans), (1, 1));
        assert!(outcome.last_error.unwrap().is_parse());
        assert_eq!(strategy.calls(), 2);
    }

    #[test]
    fn invalid_twice_falls_back_to_empty() {
        let mut strategy = ScriptedStrategy::new(["nope", BAD_ACTION, VALID]);
        let outcome = obtain_plan(&mut strategy, &snapshot(), "", &PlanningConfig::default());
        assert_eq!(outcome.source, PlanSource::Empty);
        assert!(outcome.plan.is_empty());
        assert_eq!((outcome.invalid_json, outcome.replans), (2, 1));
        assert_eq!(
            outcome.last_error.unwrap().to_string(),
            "command 0: invalid action_name"
        );
        assert_eq!(strategy.remaining(), 1);
    }

    #[test]
    fn repair_on_exhaustion_keeps_salvageable_commands() {
        let config = PlanningConfig {
            max_retries: 0,
            repair_on_exhaustion: true,
            ..PlanningConfig::default()
        };
        let mut strategy = ScriptedStrategy::new([BAD_ACTION]);
        let outcome = obtain_plan(&mut strategy, &snapshot(), "", &config);
        assert_eq!(outcome.source, PlanSource::Repaired);
        assert_eq!(
            outcome.plan.commands,
            vec![Command::move_to("2", Position::new(1, 2))]
        );
        assert_eq!((outcome.invalid_json, outcome.replans), (1, 0));
    }

    struct Broken;

    impl StrategyPort for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn propose(&mut self, _request: &PlanRequest<'_>) -> Result<String, StrategyError> {
            Err(StrategyError::Unavailable {
                message: "connection refused".to_owned(),
            })
        }
    }

    #[test]
    fn strategy_error_yields_empty_plan() {
        let outcome = obtain_plan(&mut Broken, &snapshot(), "", &PlanningConfig::default());
        assert_eq!(outcome.source, PlanSource::Empty);
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.invalid_json, 0);
    }

    struct Echo {
        saw_feedback: bool,
    }

    impl StrategyPort for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn propose(&mut self, request: &PlanRequest<'_>) -> Result<String, StrategyError> {
            if request.is_retry() {
                self.saw_feedback = true;
                Ok(VALID.to_owned())
            } else {
                Ok("{}".to_owned())
            }
        }
    }

    #[test]
    fn retry_carries_feedback() {
        let mut echo = Echo {
            saw_feedback: false,
        };
        let outcome = obtain_plan(&mut echo, &snapshot(), "", &PlanningConfig::default());
        assert!(echo.saw_feedback);
        assert_eq!(outcome.source, PlanSource::Strategy);
    }
}
