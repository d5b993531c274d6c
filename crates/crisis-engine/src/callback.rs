//! Tick callbacks wired into the episode runner.
//!
//! [`ObserverCallback`] publishes a [`StateBroadcast`] to the observer after
//! every tick. [`CritiqueCallback`] turns rejected commands into critique
//! memory entries. [`CallbackChain`] runs several callbacks in order.

use std::sync::Arc;

use chrono::Utc;
use crisis_core::memory::{CritiqueMemory, critique_tick};
use crisis_core::runner::TickCallback;
use crisis_core::tick::TickSummary;
use crisis_core::world::WorldState;
use crisis_observer::state::{AppState, StateBroadcast};
use tracing::{debug, warn};

/// Callback that bridges the tick cycle to the Observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a new observer callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl TickCallback for ObserverCallback {
    fn on_tick(&mut self, summary: &TickSummary, world: &WorldState) {
        let message = StateBroadcast {
            run_id: world.run_id(),
            tick: summary.tick,
            status: summary.status,
            state: world.summarize(),
            metrics: world.metrics_report(),
            timestamp: Utc::now(),
        };
        let receivers = self.state.publish(message);
        debug!(tick = summary.tick, receivers, "State broadcast sent");
    }
}

/// Callback that records a critique whenever a tick rejected commands.
pub struct CritiqueCallback {
    memory: CritiqueMemory,
}

impl CritiqueCallback {
    /// Record critiques into `memory`.
    pub const fn new(memory: CritiqueMemory) -> Self {
        Self { memory }
    }
}

impl TickCallback for CritiqueCallback {
    fn on_tick(&mut self, summary: &TickSummary, _world: &WorldState) {
        let Some(critique) = critique_tick(summary) else {
            return;
        };
        if let Err(e) = self.memory.append(critique) {
            warn!(tick = summary.tick, error = %e, "Failed to record critique");
        }
    }
}

/// Runs each callback in insertion order.
#[derive(Default)]
pub struct CallbackChain {
    callbacks: Vec<Box<dyn TickCallback>>,
}

impl CallbackChain {
    /// An empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback.
    pub fn push(&mut self, callback: impl TickCallback + 'static) {
        self.callbacks.push(Box::new(callback));
    }
}

impl TickCallback for CallbackChain {
    fn on_tick(&mut self, summary: &TickSummary, world: &WorldState) {
        for callback in &mut self.callbacks {
            callback.on_tick(summary, world);
        }
    }
}
