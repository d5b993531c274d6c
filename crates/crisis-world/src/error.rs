//! Error types for the `crisis-world` crate.

use crisis_types::Position;

/// Errors raised while constructing world geometry.
///
/// These are configuration errors: the world refuses to start rather than
/// run with a corrupt layout.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Width or height is zero or negative.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions {
        /// Configured width.
        width: i32,
        /// Configured height.
        height: i32,
    },

    /// A hospital was configured with no beds.
    #[error("hospital at {pos} has zero capacity")]
    ZeroCapacity {
        /// Hospital position.
        pos: Position,
    },

    /// An entity was placed outside the grid.
    #[error("{entity} at {pos} lies outside the {width}x{height} grid")]
    OutOfBounds {
        /// What was being placed (e.g. "depot", "hospital").
        entity: String,
        /// Offending position.
        pos: Position,
        /// Grid width.
        width: i32,
        /// Grid height.
        height: i32,
    },
}
