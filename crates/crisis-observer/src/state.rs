//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel that feeds `WebSocket` clients
//! and the latest published [`StateBroadcast`] that the REST endpoints
//! serve. The engine publishes once per tick; publishing never waits on a
//! reader.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use crisis_core::operator::RunControl;
use crisis_types::{MetricsReport, RunId, SimulationStatus, StateSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use ts_rs::TS;

/// Capacity of the broadcast channel.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest message.
pub const BROADCAST_CAPACITY: usize = 256;

/// Per-tick message pushed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateBroadcast {
    /// Run the state belongs to.
    pub run_id: RunId,
    /// Tick number after the advance.
    pub tick: u64,
    /// Run status after the tick.
    pub status: SimulationStatus,
    /// Planner-visible world projection.
    pub state: StateSnapshot,
    /// Metrics so far.
    pub metrics: MetricsReport,
    /// When the message was built.
    pub timestamp: DateTime<Utc>,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broadcast sender for per-tick messages.
    pub tx: broadcast::Sender<StateBroadcast>,
    /// The most recently published message, if any.
    pub latest: Arc<RwLock<Option<StateBroadcast>>>,
    /// Run controls, present when a run is attached.
    pub control: Option<Arc<RunControl>>,
}

impl AppState {
    /// Create an application state with nothing published yet.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            latest: Arc::new(RwLock::new(None)),
            control: None,
        }
    }

    /// Create an application state with run controls attached.
    pub fn with_control(control: Arc<RunControl>) -> Self {
        Self {
            control: Some(control),
            ..Self::new()
        }
    }

    /// Subscribe to the per-tick stream.
    pub fn subscribe(&self) -> broadcast::Receiver<StateBroadcast> {
        self.tx.subscribe()
    }

    /// Send a message to all connected clients.
    ///
    /// Returns the number of receivers, 0 when nobody is connected.
    pub fn broadcast(&self, message: &StateBroadcast) -> usize {
        // send fails only when there are zero receivers.
        self.tx.send(message.clone()).unwrap_or(0)
    }

    /// Broadcast `message` and store it for the REST endpoints.
    ///
    /// The stored copy is skipped when a reader holds the lock; the next
    /// tick catches up. Returns the number of receivers.
    pub fn publish(&self, message: StateBroadcast) -> usize {
        let receivers = self.broadcast(&message);
        if let Ok(mut latest) = self.latest.try_write() {
            *latest = Some(message);
        }
        receivers
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crisis_types::Position;

    use super::*;

    fn message(tick: u64) -> StateBroadcast {
        StateBroadcast {
            run_id: RunId::new(),
            tick,
            status: SimulationStatus::Running,
            state: StateSnapshot {
                tick,
                width: 3,
                height: 3,
                depot: Position::new(0, 0),
                agents: Vec::new(),
                hospitals: Vec::new(),
                fires: Vec::new(),
                rubble: Vec::new(),
                survivors: Vec::new(),
            },
            metrics: MetricsReport::default(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_still_stores() {
        let state = AppState::new();
        assert_eq!(state.publish(message(1)), 0);
        assert_eq!(state.latest.read().await.as_ref().map(|m| m.tick), Some(1));
    }

    #[tokio::test]
    async fn every_subscriber_receives() {
        let state = AppState::new();
        let mut a = state.subscribe();
        let mut b = state.subscribe();
        assert_eq!(state.publish(message(2)), 2);
        assert_eq!(a.recv().await.unwrap().tick, 2);
        assert_eq!(b.recv().await.unwrap().tick, 2);
    }

    #[test]
    fn broadcast_serializes_expected_keys() {
        let json = serde_json::to_value(message(3)).unwrap();
        for key in ["run_id", "tick", "status", "state", "metrics"] {
            assert!(json.get(key).is_some(), "{key}");
        }
        assert_eq!(json["status"], "running");
    }
}
