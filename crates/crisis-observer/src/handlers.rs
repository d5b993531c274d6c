//! REST endpoint handlers for the Observer server.
//!
//! All handlers read the latest published
//! [`StateBroadcast`](crate::state::StateBroadcast).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/state` | Latest world snapshot |
//! | `GET` | `/api/metrics` | Latest metrics |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use crisis_types::SimulationStatus;

use crate::error::ObserverError;
use crate::state::AppState;

/// Serve a minimal HTML page showing run status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest.read().await;
    let (tick, status, waiting, rescued, deaths) = latest.as_ref().map_or(
        (0, "WAITING", 0, 0, 0),
        |m| {
            let status = match m.status {
                SimulationStatus::Running => "RUNNING",
                SimulationStatus::Terminated => "TERMINATED",
            };
            (
                m.tick,
                status,
                m.state.survivors.len(),
                m.metrics.rescued,
                m.metrics.deaths,
            )
        },
    );

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>CrisisSim Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>CrisisSim Observer</h1>
    <p>Status: <span class="status">{status}</span></p>
    <div>
        <div class="metric"><div class="label">Tick</div><div class="value">{tick}</div></div>
        <div class="metric"><div class="label">Waiting</div><div class="value">{waiting}</div></div>
        <div class="metric"><div class="label">Rescued</div><div class="value">{rescued}</div></div>
        <div class="metric"><div class="label">Deaths</div><div class="value">{deaths}</div></div>
    </div>
    <h2>API</h2>
    <ul>
        <li><a href="/api/state">/api/state</a> -- Latest world snapshot</li>
        <li><a href="/api/metrics">/api/metrics</a> -- Latest metrics</li>
        <li><a href="/api/operator/status">/api/operator/status</a> -- Run controls</li>
        <li><code>ws://host:port/ws/state</code> -- Live state stream</li>
    </ul>
</body>
</html>"#
    ))
}

/// Return the latest world snapshot with its tick and status.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let latest = state.latest.read().await;
    let message = latest
        .as_ref()
        .ok_or(ObserverError::NothingPublished)?;
    Ok(Json(serde_json::json!({
        "run_id": message.run_id,
        "tick": message.tick,
        "status": message.status,
        "state": serde_json::to_value(&message.state)?,
    })))
}

/// Return the latest metrics.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let latest = state.latest.read().await;
    let message = latest
        .as_ref()
        .ok_or(ObserverError::NothingPublished)?;
    Ok(Json(serde_json::to_value(&message.metrics)?))
}
