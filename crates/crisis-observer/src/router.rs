//! Axum router construction for the Observer API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, operator, ws};

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/state` -- `WebSocket` state stream
/// - `GET /api/state` -- latest world snapshot
/// - `GET /api/metrics` -- latest metrics
/// - `/api/operator/*` -- run controls
///
/// CORS allows any origin so a dashboard can be served from elsewhere.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/state", get(ws::ws_state))
        .route("/api/state", get(handlers::get_state))
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/speed", post(operator::speed))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
