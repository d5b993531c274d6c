//! Bounded grid geometry.

use crisis_types::Position;

use crate::error::WorldError;

/// Neighbor offsets in expansion order: down, right, up, left.
///
/// Every search and spread rule walks neighbors in this order so equally
/// short paths tie-break the same way on every run.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// A `width` by `height` grid anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
}

impl Grid {
    /// Create a grid, rejecting non-positive dimensions.
    pub const fn new(width: i32, height: i32) -> Result<Self, WorldError> {
        if width <= 0 || height <= 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width in cells.
    pub const fn width(self) -> i32 {
        self.width
    }

    /// Height in cells.
    pub const fn height(self) -> i32 {
        self.height
    }

    /// Whether `pos` lies on the grid.
    pub const fn contains(self, pos: Position) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    /// Fail with [`WorldError::OutOfBounds`] unless `pos` lies on the grid.
    pub fn require(self, entity: &str, pos: Position) -> Result<(), WorldError> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(WorldError::OutOfBounds {
                entity: entity.to_owned(),
                pos,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// In-bounds 4-neighbors of `pos`, in [`NEIGHBOR_OFFSETS`] order.
    pub fn neighbors(self, pos: Position) -> impl Iterator<Item = Position> {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| pos.offset(dx, dy))
            .filter(move |p| self.contains(*p))
    }
}
