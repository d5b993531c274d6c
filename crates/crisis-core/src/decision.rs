//! Strategy port and built-in strategies.
//!
//! Once per tick the runner presents a [`StrategyPort`] with a read-only
//! [`StateSnapshot`] and asks for a plan as raw text. The port abstracts how
//! that text is produced: a language model, a rule-based baseline, a replay
//! of a recorded transcript, or a test stub. The text is untrusted; it only
//! reaches the world after passing [`crate::validator`].

use std::collections::VecDeque;

use crisis_types::StateSnapshot;

use crate::validator::PlanError;

/// The canonical empty plan, as raw text.
pub const EMPTY_PLAN: &str = r#"{"commands": []}"#;

/// Errors a strategy may report instead of a response.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// The backing service could not be reached or refused the request.
    #[error("strategy unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// An internal error in the strategy.
    #[error("strategy error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// Everything a strategy sees when asked for a plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    /// Current world projection.
    pub snapshot: &'a StateSnapshot,
    /// Recent plans, one line per tick.
    pub scratchpad: &'a str,
    /// Why the previous response for this tick was rejected, on a retry.
    pub feedback: Option<&'a PlanError>,
}

impl<'a> PlanRequest<'a> {
    /// A first-attempt request.
    pub const fn new(snapshot: &'a StateSnapshot, scratchpad: &'a str) -> Self {
        Self {
            snapshot,
            scratchpad,
            feedback: None,
        }
    }

    /// The same request, carrying the error from a rejected attempt.
    #[must_use]
    pub const fn with_feedback(self, feedback: &'a PlanError) -> Self {
        Self {
            feedback: Some(feedback),
            ..self
        }
    }

    /// Whether this is a retry after a rejected response.
    pub const fn is_retry(&self) -> bool {
        self.feedback.is_some()
    }
}

/// A source of plans.
///
/// Calls are synchronous request/response. Implementations that talk to a
/// remote service should enforce their own timeout and report failures as
/// [`StrategyError`]; the runner substitutes the empty plan for that tick.
pub trait StrategyPort {
    /// Short name used in logs and result file names.
    fn name(&self) -> &str;

    /// Produce the raw text of a plan.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError`] when no response could be produced.
    fn propose(&mut self, request: &PlanRequest<'_>) -> Result<String, StrategyError>;
}

impl<S: StrategyPort + ?Sized> StrategyPort for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn propose(&mut self, request: &PlanRequest<'_>) -> Result<String, StrategyError> {
        (**self).propose(request)
    }
}

/// A strategy that never issues commands.
#[derive(Debug, Clone, Default)]
pub struct IdleStrategy;

impl IdleStrategy {
    /// Create a new idle strategy.
    pub const fn new() -> Self {
        Self
    }
}

impl StrategyPort for IdleStrategy {
    fn name(&self) -> &str {
        "idle"
    }

    fn propose(&mut self, _request: &PlanRequest<'_>) -> Result<String, StrategyError> {
        Ok(EMPTY_PLAN.to_owned())
    }
}

/// Replays a fixed list of raw responses, one per call, then goes idle.
///
/// Each retry consumes a response too, so a transcript with a malformed
/// entry followed by a corrected one replays the retry faithfully.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStrategy {
    responses: VecDeque<String>,
    calls: usize,
}

impl ScriptedStrategy {
    /// Create a strategy that replays `responses` in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            calls: 0,
        }
    }

    /// Responses not yet replayed.
    pub fn remaining(&self) -> usize {
        self.responses.len()
    }

    /// Number of times [`StrategyPort::propose`] was called.
    pub const fn calls(&self) -> usize {
        self.calls
    }
}

impl StrategyPort for ScriptedStrategy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn propose(&mut self, _request: &PlanRequest<'_>) -> Result<String, StrategyError> {
        self.calls = self.calls.saturating_add(1);
        Ok(self
            .responses
            .pop_front()
            .unwrap_or_else(|| EMPTY_PLAN.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crisis_types::Position;

    use super::*;

    fn snapshot() -> StateSnapshot {
        StateSnapshot {
            tick: 0,
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

    #[test]
    fn idle_returns_empty_plan() {
        let snap = snapshot();
        let mut idle = IdleStrategy::new();
        let text = idle.propose(&PlanRequest::new(&snap, "")).unwrap();
        assert_eq!(text, EMPTY_PLAN);
    }

    #[test]
    fn scripted_replays_then_idles() {
        let snap = snapshot();
        let request = PlanRequest::new(&snap, "");
        let mut scripted = ScriptedStrategy::new(["first", "second"]);
        assert_eq!(scripted.propose(&request).unwrap(), "first");
        assert_eq!(scripted.remaining(), 1);
        assert_eq!(scripted.propose(&request).unwrap(), "second");
        assert_eq!(scripted.propose(&request).unwrap(), EMPTY_PLAN);
        assert_eq!(scripted.calls(), 3);
    }

    #[test]
    fn boxed_strategy_delegates() {
        let snap = snapshot();
        let mut boxed: Box<dyn StrategyPort> = Box::new(ScriptedStrategy::new(["x"]));
        assert_eq!(boxed.name(), "scripted");
        assert_eq!(boxed.propose(&PlanRequest::new(&snap, "")).unwrap(), "x");
    }

    #[test]
    fn feedback_marks_retry() {
        let snap = snapshot();
        let error = PlanError::Parse {
            reason: "no JSON object found".to_owned(),
        };
        let request = PlanRequest::new(&snap, "").with_feedback(&error);
        assert!(request.is_retry());
    }
}
