//! Operator endpoints for controlling an attached run.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Current control flags |
//! | `POST` | `/api/operator/pause` | Hold the episode loop |
//! | `POST` | `/api/operator/resume` | Release the episode loop |
//! | `POST` | `/api/operator/speed` | Set the tick interval (ms) |
//! | `POST` | `/api/operator/stop` | Stop before the next tick |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use crisis_core::operator::{MAX_TICK_INTERVAL_MS, MIN_TICK_INTERVAL_MS, RunControl};

use crate::error::ObserverError;
use crate::state::AppState;

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds, 10 to 60000.
    pub tick_interval_ms: u64,
}

#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    ok: bool,
    message: String,
}

fn control(state: &AppState) -> Result<&RunControl, ObserverError> {
    state
        .control
        .as_deref()
        .ok_or(ObserverError::NoRunAttached)
}

fn done(message: impl Into<String>) -> Json<OperatorResponse> {
    Json(OperatorResponse {
        ok: true,
        message: message.into(),
    })
}

/// Report the current control flags.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let control = control(&state)?;
    Ok(Json(serde_json::json!({
        "paused": control.is_paused(),
        "stop_requested": control.is_stop_requested(),
        "tick_interval_ms": control.tick_interval_ms(),
    })))
}

/// Hold the episode loop before its next tick.
pub async fn pause(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    control(&state)?.pause();
    Ok(done("Run paused"))
}

/// Release a paused episode loop.
pub async fn resume(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    control(&state)?.resume();
    Ok(done("Run resumed"))
}

/// Change the pause between ticks. Values outside
/// `MIN_TICK_INTERVAL_MS..=MAX_TICK_INTERVAL_MS` are refused with 400.
pub async fn speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let requested = body.tick_interval_ms;
    let old = control(&state)?
        .set_tick_interval_ms(requested)
        .ok_or_else(|| {
            ObserverError::InvalidRequest(format!(
                "tick_interval_ms must be between {MIN_TICK_INTERVAL_MS} and {MAX_TICK_INTERVAL_MS}"
            ))
        })?;
    Ok(done(format!(
        "Tick interval changed from {old}ms to {requested}ms"
    )))
}

/// Stop the run before its next tick.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    control(&state)?.request_stop();
    Ok(done("Stop requested"))
}
