//! Observer API server for CrisisSim.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/state`) streaming one
//!   [`StateBroadcast`] per tick via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the latest snapshot and metrics
//! - **Operator endpoints** for pausing, pacing, and stopping a run
//! - **Minimal HTML status page** (`GET /`)
//!
//! The engine publishes into [`AppState`] after every tick. Publishing never
//! blocks the tick loop: broadcast sends are fire-and-forget and the REST
//! copy is updated with `try_write`.

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, bind, serve};
pub use state::{AppState, StateBroadcast};
