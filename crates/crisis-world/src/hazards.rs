//! Fire spread.
//!
//! Fires spread once per tick, after plan application. Each burning cell
//! rolls independently; on success it ignites one of its free 4-neighbors.
//! A cell is free when it is on the grid, not already burning, and not
//! protected (rubble, hospitals, and the depot never ignite).
//!
//! # Determinism
//!
//! Rolls come from an `xorshift64` generator keyed by
//! `(world_seed, tick, cell_index)`, so a seed replays the same spread
//! pattern regardless of how the planner behaves elsewhere on the map.

use std::collections::BTreeSet;

use crisis_types::Position;
use tracing::debug;

use crate::grid::Grid;

/// Deterministic fire-spread rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireSpread {
    world_seed: u64,
    chance_percent: u32,
    max_fires: usize,
}

impl FireSpread {
    /// Create a spread rule. A chance of zero disables spread; chances above
    /// 100 behave as 100.
    pub const fn new(world_seed: u64, chance_percent: u32, max_fires: usize) -> Self {
        Self {
            world_seed,
            chance_percent,
            max_fires,
        }
    }

    /// Compute the cells that ignite at `tick`.
    ///
    /// Does not mutate `fires`; the caller inserts the returned cells. The
    /// total fire count never exceeds the configured maximum.
    pub fn spread(
        &self,
        tick: u64,
        fires: &BTreeSet<Position>,
        protected: &BTreeSet<Position>,
        grid: Grid,
    ) -> Vec<Position> {
        let mut ignited: Vec<Position> = Vec::new();
        if self.chance_percent == 0 {
            return ignited;
        }

        for (index, &cell) in fires.iter().enumerate() {
            if fires.len().saturating_add(ignited.len()) >= self.max_fires {
                break;
            }
            let salt = u64::try_from(index).unwrap_or(u64::MAX);
            let random = deterministic_random(self.world_seed, tick, salt);
            let roll = random.checked_rem(100).unwrap_or(0);
            if roll >= u64::from(self.chance_percent) {
                continue;
            }

            let candidates: Vec<Position> = grid
                .neighbors(cell)
                .filter(|p| !fires.contains(p) && !protected.contains(p) && !ignited.contains(p))
                .collect();
            let count = u64::try_from(candidates.len()).unwrap_or(0);
            let Some(pick) = (random >> 8).checked_rem(count) else {
                continue;
            };
            let pick = usize::try_from(pick).unwrap_or(0);
            if let Some(&target) = candidates.get(pick) {
                debug!(tick, from = %cell, to = %target, "fire spread");
                ignited.push(target);
            }
        }
        ignited
    }
}

/// Deterministic pseudo-random number generator using `xorshift64`.
///
/// Mixes the world seed, tick, and a per-call salt so every
/// `(seed, tick, salt)` triple maps to its own value.
const fn deterministic_random(world_seed: u64, tick: u64, salt: u64) -> u64 {
    let mut state = world_seed
        .wrapping_add(tick.wrapping_mul(0x517c_c1b7_2722_0a95))
        .wrapping_add(salt.wrapping_mul(0x9e37_79b9_7f4a_7c15));

    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }

    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;

    state
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(10, 10).unwrap()
    }

    fn set(cells: &[(i32, i32)]) -> BTreeSet<Position> {
        cells.iter().map(|&(x, y)| Position::new(x, y)).collect()
    }

    #[test]
    fn zero_chance_never_spreads() {
        let rule = FireSpread::new(42, 0, 100);
        let fires = set(&[(5, 5)]);
        for tick in 0..50 {
            assert!(rule.spread(tick, &fires, &BTreeSet::new(), grid()).is_empty());
        }
    }

    #[test]
    fn certain_spread_ignites_a_free_neighbor() {
        let rule = FireSpread::new(7, 100, 100);
        let fires = set(&[(5, 5)]);
        let out = rule.spread(1, &fires, &BTreeSet::new(), grid());
        assert_eq!(out.len(), 1);
        let cell = out.first().copied().unwrap();
        assert_eq!(crate::router::distance(cell, Position::new(5, 5)), 1);
    }

    #[test]
    fn protected_cells_never_ignite() {
        let rule = FireSpread::new(7, 100, 100);
        let fires = set(&[(0, 0)]);
        let protected = set(&[(0, 1), (1, 0)]);
        for tick in 0..20 {
            assert!(rule.spread(tick, &fires, &protected, grid()).is_empty());
        }
    }

    #[test]
    fn max_fires_caps_growth() {
        let rule = FireSpread::new(3, 100, 3);
        let fires = set(&[(2, 2), (6, 6)]);
        let out = rule.spread(4, &fires, &BTreeSet::new(), grid());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn same_seed_same_pattern() {
        let rule = FireSpread::new(99, 50, 100);
        let fires = set(&[(1, 1), (4, 4), (8, 2)]);
        let a = rule.spread(12, &fires, &BTreeSet::new(), grid());
        let b = rule.spread(12, &fires, &BTreeSet::new(), grid());
        assert_eq!(a, b);
    }
}
