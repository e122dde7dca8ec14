use std::collections::HashSet;

use super::{search, Contention};
use crate::grid::{Grid, Position};

/// How far from the midpoint a detour waypoint is placed.
const DETOUR_OFFSET: i32 = 2;

/// Re-plans a route with `blocked` cells treated as obstacles.
///
/// Strategies are tried in order and the first non-empty route wins:
///
/// 1. a plain contention-aware search;
/// 2. a detour through a waypoint two cells off the start/goal midpoint
///    (right, left, below, then above);
/// 3. a search that treats every other forklift's cell as an obstacle and
///    ignores contention costs.
pub fn find_alternate_path(
    grid: &Grid,
    start: Position,
    goal: Position,
    contention: &Contention<'_>,
    blocked: &[Position],
) -> Vec<Position> {
    let mut blocked: HashSet<Position> = blocked.iter().copied().collect();

    let path = search(grid, start, goal, contention, &blocked);
    if !path.is_empty() {
        return path;
    }

    let path = via_detour(grid, start, goal, contention, &blocked);
    if !path.is_empty() {
        return path;
    }

    blocked.extend(contention.others().map(|f| f.position));
    search(grid, start, goal, &Contention::none(), &blocked)
}

fn via_detour(
    grid: &Grid,
    start: Position,
    goal: Position,
    contention: &Contention<'_>,
    blocked: &HashSet<Position>,
) -> Vec<Position> {
    let mid = start.midpoint(&goal);
    let waypoints = [
        mid.offset(DETOUR_OFFSET, 0),
        mid.offset(-DETOUR_OFFSET, 0),
        mid.offset(0, DETOUR_OFFSET),
        mid.offset(0, -DETOUR_OFFSET),
    ];
    for waypoint in waypoints {
        if !grid.is_traversable(waypoint) || blocked.contains(&waypoint) {
            continue;
        }
        let first = search(grid, start, waypoint, contention, blocked);
        if first.is_empty() {
            continue;
        }
        let second = search(grid, waypoint, goal, contention, blocked);
        if second.is_empty() {
            continue;
        }
        let mut path = first;
        path.extend(second.into_iter().skip(1));
        return path;
    }
    Vec::new()
}
