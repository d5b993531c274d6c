//! World state, tick application, and episode orchestration for CrisisSim.
//!
//! This crate owns everything between an untrusted planner response and a
//! mutated world: plan extraction and validation, retry and fallback, the
//! per-tick command pipeline, hospital and hazard updates, and the episode
//! loop that ties them together.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter with a ceiling and the running/terminated
//!   transition.
//! - [`config`] -- Scenario configuration loaded from `crisis-config.yaml`
//!   into strongly-typed structs.
//! - [`decision`] -- [`StrategyPort`] trait, [`IdleStrategy`], and
//!   [`ScriptedStrategy`].
//! - [`memory`] -- File-backed critique memory.
//! - [`metrics`] -- Running counters for one episode.
//! - [`operator`] -- Cooperative stop, pause, and pacing controls.
//! - [`planning`] -- Retry-with-feedback plan acquisition.
//! - [`runner`] -- The episode loop.
//! - [`tick`] -- Command dispatch and end-of-tick world update.
//! - [`validator`] -- Plan extraction, schema validation, and repair.
//! - [`world`] -- [`WorldState`] construction and snapshots.
//!
//! [`StrategyPort`]: decision::StrategyPort
//! [`IdleStrategy`]: decision::IdleStrategy
//! [`ScriptedStrategy`]: decision::ScriptedStrategy
//! [`WorldState`]: world::WorldState

pub mod clock;
pub mod config;
pub mod decision;
pub mod memory;
pub mod metrics;
pub mod operator;
pub mod planning;
pub mod runner;
pub mod tick;
pub mod validator;
pub mod world;
