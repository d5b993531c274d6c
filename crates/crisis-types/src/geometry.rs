//! Grid coordinates.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A cell on the simulation grid.
///
/// Serialized as a two-element array `[x, y]`, the shape planners use for
/// the `to` field of a move command. `x` grows rightward, `y` grows downward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Position(pub i32, pub i32);

impl Position {
    /// Create a position from its column and row.
    pub const fn new(x: i32, y: i32) -> Self {
        Self(x, y)
    }

    /// Column.
    pub const fn x(self) -> i32 {
        self.0
    }

    /// Row.
    pub const fn y(self) -> i32 {
        self.1
    }

    /// Offset this position by `(dx, dy)`.
    ///
    /// Returns `None` if either coordinate would overflow.
    pub const fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        match (self.0.checked_add(dx), self.1.checked_add(dy)) {
            (Some(x), Some(y)) => Some(Self(x, y)),
            _ => None,
        }
    }

    /// Whether this position lies inside a `width` by `height` grid anchored
    /// at the origin.
    pub const fn in_bounds(self, width: i32, height: i32) -> bool {
        self.0 >= 0 && self.1 >= 0 && self.0 < width && self.1 < height
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self(x, y)
    }
}
