//! Episode loop.
//!
//! [`run_episode`] drives one world from its first tick to termination:
//!
//! - **Controls**: pause and stop requests are honored at the top of each
//!   tick, before the strategy is asked for anything
//! - **Planning**: the strategy sees the snapshot plus a scratchpad of the
//!   most recent plans, and invalid responses go through retry and fallback
//! - **Pacing**: an optional sleep between ticks for live observation, cut
//!   short by stop, pause, or speed changes
//!
//! The loop never aborts on strategy trouble; a failing strategy simply
//! produces empty plans until the run ends.

use crisis_types::{MetricsReport, Plan, RunId};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PlanningConfig;
use crate::decision::StrategyPort;
use crate::operator::{EndReason, RunControl};
use crate::planning::{self, PlanSource};
use crate::tick::{TickError, TickSummary};
use crate::world::WorldState;

/// Errors that can occur during an episode.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// One applied plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    /// Tick the plan was applied at.
    pub tick: u64,
    /// The plan that was applied.
    pub plan: Plan,
    /// Where the plan came from.
    pub source: PlanSource,
}

/// Outcome of a finished episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeResult {
    /// Run identifier.
    pub run_id: RunId,
    /// Scenario name.
    pub scenario: String,
    /// Strategy name.
    pub strategy: String,
    /// Why the episode ended.
    pub end_reason: EndReason,
    /// Ticks executed by this call.
    pub total_ticks: u64,
    /// Final metrics.
    pub metrics: MetricsReport,
    /// Every applied plan, in order.
    pub transcript: Vec<TranscriptEntry>,
}

/// Callback invoked after each tick completes.
///
/// Implementations publish state to observers, record critiques, and so on.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, world: &WorldState);
}

/// A no-op tick callback for testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _world: &WorldState) {}
}

/// Format the last `window` transcript entries as `Tick N: <commands>`
/// lines, oldest first.
pub fn build_scratchpad(transcript: &[TranscriptEntry], window: usize) -> String {
    let start = transcript.len().saturating_sub(window);
    transcript
        .get(start..)
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let commands =
                serde_json::to_string(&entry.plan.commands).unwrap_or_else(|_| "[]".to_owned());
            format!("Tick {}: {commands}", entry.tick)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn finished_reason(world: &WorldState) -> EndReason {
    if world.all_resolved() {
        EndReason::AllSurvivorsResolved
    } else {
        EndReason::MaxTicksReached
    }
}

/// Run one episode until the world terminates or a stop is requested.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails unrecoverably.
pub async fn run_episode<S>(
    world: &mut WorldState,
    strategy: &mut S,
    control: &RunControl,
    callback: &mut dyn TickCallback,
    planning: &PlanningConfig,
) -> Result<EpisodeResult, RunnerError>
where
    S: StrategyPort + ?Sized,
{
    let mut transcript: Vec<TranscriptEntry> = Vec::new();
    let mut total_ticks: u64 = 0;

    info!(
        run_id = %world.run_id(),
        scenario = world.name(),
        strategy = strategy.name(),
        max_ticks = world.clock.max_ticks(),
        "Episode starting"
    );

    let end_reason = loop {
        if control.is_paused() {
            info!("Episode paused, waiting for resume");
            control.wait_if_paused().await;
        }
        if control.is_stop_requested() {
            info!(tick = world.tick(), "Stop requested");
            break EndReason::Stopped;
        }
        if !world.is_running() {
            break finished_reason(world);
        }

        let snapshot = world.summarize();
        let scratchpad = build_scratchpad(&transcript, planning.scratchpad_window);
        let outcome = planning::obtain_plan(strategy, &snapshot, &scratchpad, planning);
        world.record_plan_attempts(outcome.invalid_json, outcome.replans);

        let summary = world.apply(&outcome.plan)?;
        total_ticks = total_ticks.saturating_add(1);
        transcript.push(TranscriptEntry {
            tick: snapshot.tick,
            plan: outcome.plan,
            source: outcome.source,
        });

        callback.on_tick(&summary, world);

        if !world.is_running() {
            break finished_reason(world);
        }

        control.pace().await;
    };

    Ok(EpisodeResult {
        run_id: world.run_id(),
        scenario: world.name().to_owned(),
        strategy: strategy.name().to_owned(),
        end_reason,
        total_ticks,
        metrics: world.metrics_report(),
        transcript,
    })
}

/// Log the end of an episode.
pub fn log_episode_end(result: &EpisodeResult) {
    info!(
        run_id = %result.run_id,
        scenario = %result.scenario,
        strategy = %result.strategy,
        reason = %result.end_reason,
        total_ticks = result.total_ticks,
        rescued = result.metrics.rescued,
        deaths = result.metrics.deaths,
        success_rate = result.metrics.success_rate,
        "Episode ended"
    );
    if result.total_ticks == 0 {
        warn!(run_id = %result.run_id, "Episode ended with no ticks executed");
    }
}
