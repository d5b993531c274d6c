//! Live state stream at `GET /ws/state`.
//!
//! A new client first gets the most recent [`StateBroadcast`] as a catch-up
//! frame, then one JSON frame per tick. The subscription is taken before the
//! catch-up read, so the first broadcast may repeat the catch-up tick; such
//! repeats are dropped. A slow client loses intermediate ticks, never the
//! newest one.

use std::sync::Arc;

use axum::Error as AxumError;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use crisis_types::RunId;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, StateBroadcast};

/// Upgrade to a `WebSocket` and stream world states.
pub async fn ws_state(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_states(socket, state))
}

/// Whether the connection stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Open,
    Closed,
}

/// Last `(run, tick)` delivered to one client.
#[derive(Debug, Default)]
struct Cursor(Option<(RunId, u64)>);

impl Cursor {
    /// Record `message` and report whether it is new to this client.
    fn advance(&mut self, message: &StateBroadcast) -> bool {
        let key = (message.run_id, message.tick);
        if self.0 == Some(key) {
            return false;
        }
        self.0 = Some(key);
        true
    }
}

async fn stream_states(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.subscribe();
    let mut cursor = Cursor::default();

    let catch_up = state.latest.read().await.clone();
    if let Some(message) = catch_up {
        cursor.advance(&message);
        if send_state(&mut socket, &message).await == Flow::Closed {
            return;
        }
    }

    loop {
        let flow = tokio::select! {
            received = rx.recv() => match received {
                Ok(message) if cursor.advance(&message) => send_state(&mut socket, &message).await,
                Ok(_) => Flow::Open,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "State client lagged, resuming at newest tick");
                    Flow::Open
                }
                Err(RecvError::Closed) => Flow::Closed,
            },
            incoming = socket.recv() => on_client_frame(&mut socket, incoming).await,
        };
        if flow == Flow::Closed {
            break;
        }
    }
    debug!(last = ?cursor.0, "State client gone");
}

async fn send_state(socket: &mut WebSocket, message: &StateBroadcast) -> Flow {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            warn!(tick = message.tick, error = %e, "Failed to encode state frame");
            return Flow::Open;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        Flow::Closed
    } else {
        Flow::Open
    }
}

/// Clients only ever ping or close; anything else is ignored.
async fn on_client_frame(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, AxumError>>,
) -> Flow {
    match incoming {
        Some(Ok(Message::Ping(payload))) => {
            if socket.send(Message::Pong(payload)).await.is_err() {
                Flow::Closed
            } else {
                Flow::Open
            }
        }
        Some(Ok(Message::Close(_)) | Err(_)) | None => Flow::Closed,
        Some(Ok(_)) => Flow::Open,
    }
}
