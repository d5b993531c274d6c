//! Grid geometry, routing, hospital triage, and hazards for `CrisisSim`.
//!
//! Everything in this crate is synchronous and free of global state. The
//! world-state machine in `crisis-core` owns instances of these types and
//! drives them once per tick.
//!
//! # Modules
//!
//! - [`error`] -- Construction errors for world geometry.
//! - [`grid`] -- Bounded grid and neighbor expansion order.
//! - [`router`] -- Breadth-first shortest paths and Manhattan distance.
//! - [`hospital`] -- Bounded beds with a policy-ordered waiting queue.
//! - [`hazards`] -- Deterministic fire spread.

pub mod error;
pub mod grid;
pub mod hazards;
pub mod hospital;
pub mod router;

pub use error::WorldError;
pub use grid::Grid;
pub use hazards::FireSpread;
pub use hospital::{Hospital, Patient};
pub use router::{bfs, distance, next_step_toward};
