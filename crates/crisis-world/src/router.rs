//! Breadth-first grid routing.
//!
//! The router is a planner aid: the world applies move commands to their
//! literal destination and only consults [`next_step_toward`] when the
//! scenario runs in single-step movement mode.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crisis_types::Position;

use crate::grid::Grid;

/// Shortest 4-connected path from `start` to `goal` avoiding `obstacles`.
///
/// Returns the full path including both endpoints, `[start]` when
/// `start == goal`, or an empty vector when `goal` is unreachable or off
/// the grid. Neighbors are expanded down, right, up, left, so among equally
/// short paths the one found first under that order wins.
///
/// `start` itself is never checked against `obstacles`: an agent standing
/// on a freshly spread fire can still walk out.
pub fn bfs(
    start: Position,
    goal: Position,
    obstacles: &BTreeSet<Position>,
    grid: Grid,
) -> Vec<Position> {
    if start == goal {
        return vec![start];
    }

    let mut parents: HashMap<Position, Position> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    parents.insert(start, start);

    while let Some(current) = queue.pop_front() {
        for next in grid.neighbors(current) {
            if obstacles.contains(&next) || parents.contains_key(&next) {
                continue;
            }
            parents.insert(next, current);
            if next == goal {
                return reconstruct(&parents, start, goal);
            }
            queue.push_back(next);
        }
    }

    Vec::new()
}

/// Walk the parent links back from `goal` to `start`.
fn reconstruct(
    parents: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        match parents.get(&cursor) {
            Some(&prev) => {
                path.push(prev);
                cursor = prev;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

/// The cell one step along the shortest path toward `goal`.
///
/// Returns `start` unchanged when already at the goal or when no path
/// exists.
pub fn next_step_toward(
    start: Position,
    goal: Position,
    obstacles: &BTreeSet<Position>,
    grid: Grid,
) -> Position {
    bfs(start, goal, obstacles, grid)
        .get(1)
        .copied()
        .unwrap_or(start)
}

/// Manhattan distance between two cells.
pub const fn distance(a: Position, b: Position) -> u32 {
    a.x().abs_diff(b.x()).saturating_add(a.y().abs_diff(b.y()))
}
