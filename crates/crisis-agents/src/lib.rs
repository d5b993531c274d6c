//! Agent records, resource model, and capability table for `CrisisSim`.
//!
//! # Modules
//!
//! - [`agent`] -- [`Agent`] construction and per-kind resource gauges.
//! - [`capability`] -- The closed `{action, kind}` table.
//! - [`config`] -- Default resource maxima ([`ResourceConfig`]).
//! - [`error`] -- Construction errors ([`AgentError`]).
//! - [`resources`] -- Consume, replenish, and availability checks.

pub mod agent;
pub mod capability;
pub mod config;
pub mod error;
pub mod resources;

pub use agent::{Agent, AgentParams, ResourceGauge};
pub use config::ResourceConfig;
pub use error::AgentError;
