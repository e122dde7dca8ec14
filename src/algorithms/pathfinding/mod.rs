//! Contention-aware A* routing.
//!
//! Routes are 4-connected and only cross traversable cells. The search graph
//! is rebuilt for every query: the grid is small and contention changes every
//! tick, so there is nothing worth caching between calls.
//!
//! A returned path starts at the start cell and ends at the goal. An
//! unreachable goal yields an empty path rather than an error.

mod alternate;
mod cost;

pub use alternate::find_alternate_path;
pub use cost::{
    Contention, Footprint, BASE_COST, OCCUPIED_PENALTY, PLANNED_PENALTY, PROXIMITY_PENALTY,
};

use std::collections::HashSet;

use petgraph::algo::astar;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::EdgeRef;

use crate::grid::{Grid, Position};

/// Finds a least-cost route from `start` to `goal`.
///
/// Step costs come from [`Contention::step_cost`]; the Manhattan distance is
/// the heuristic, which stays admissible because every step costs at least
/// [`BASE_COST`].
pub fn find_path(
    grid: &Grid,
    start: Position,
    goal: Position,
    contention: &Contention<'_>,
) -> Vec<Position> {
    search(grid, start, goal, contention, &HashSet::new())
}

/// A* with an extra set of cells treated as obstacles.
pub(crate) fn search(
    grid: &Grid,
    start: Position,
    goal: Position,
    contention: &Contention<'_>,
    blocked: &HashSet<Position>,
) -> Vec<Position> {
    if start == goal {
        return vec![start];
    }
    let passable = |p: Position| grid.is_traversable(p) && !blocked.contains(&p);
    if !passable(goal) {
        return Vec::new();
    }

    let graph = build_graph(grid, start, &passable);
    match astar(
        &graph,
        start,
        |n| n == goal,
        |e| contention.step_cost(e.target()),
        |n| n.manhattan(&goal),
    ) {
        Some((_, path)) => path,
        None => Vec::new(),
    }
}

fn build_graph(
    grid: &Grid,
    start: Position,
    passable: &impl Fn(Position) -> bool,
) -> DiGraphMap<Position, ()> {
    let mut graph = DiGraphMap::new();
    graph.add_node(start);
    for pos in grid.positions() {
        if passable(pos) {
            graph.add_node(pos);
        }
    }
    let nodes: Vec<Position> = graph.nodes().collect();
    for from in nodes {
        for to in from.neighbors() {
            if passable(to) {
                graph.add_edge(from, to, ());
            }
        }
    }
    graph
}

/// Returns true if consecutive cells of `path` are 4-adjacent and every cell
/// after the first is traversable.
pub fn is_valid_route(grid: &Grid, path: &[Position]) -> bool {
    path.windows(2).all(|w| w[0].manhattan(&w[1]) == 1)
        && path.iter().skip(1).all(|p| grid.is_traversable(*p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

    fn open_room() -> Grid {
        Grid::from_ascii(&[
            "#########",
            "#.......#",
            "#.......#",
            "#.......#",
            "#########",
        ])
    }

    #[test]
    fn start_equals_goal() {
        let grid = open_room();
        let p = Position::new(2, 2);
        assert_eq!(find_path(&grid, p, p, &Contention::none()), vec![p]);
    }

    #[test]
    fn straight_line_is_shortest() {
        let grid = open_room();
        let path = find_path(
            &grid,
            Position::new(1, 2),
            Position::new(7, 2),
            &Contention::none(),
        );
        assert_eq!(path.len(), 7);
        assert_eq!(path.first(), Some(&Position::new(1, 2)));
        assert_eq!(path.last(), Some(&Position::new(7, 2)));
        assert!(is_valid_route(&grid, &path));
    }

    #[test]
    fn unreachable_goal_is_empty() {
        let grid = Grid::from_ascii(&["#####", "#.#.#", "#####"]);
        let path = find_path(
            &grid,
            Position::new(1, 1),
            Position::new(3, 1),
            &Contention::none(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn shelf_goal_is_unreachable() {
        let grid = Grid::from_ascii(&["#####", "#..s#", "#####"]);
        let path = find_path(
            &grid,
            Position::new(1, 1),
            Position::new(3, 1),
            &Contention::none(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn routes_around_shelves() {
        let grid = Grid::from_ascii(&[
            "#######",
            "#.....#",
            "#.sss.#",
            "#.....#",
            "#######",
        ]);
        let start = Position::new(3, 1);
        let goal = Position::new(3, 3);
        let path = find_path(&grid, start, goal, &Contention::none());
        assert!(is_valid_route(&grid, &path));
        assert_eq!(path.len(), 7);
        assert!(path.len() as u32 - 1 >= start.manhattan(&goal));
    }

    #[test]
    fn start_may_be_off_the_floor() {
        let grid = Grid::from_ascii(&["#####", "#s..#", "#####"]);
        let path = find_path(
            &grid,
            Position::new(1, 1),
            Position::new(3, 1),
            &Contention::none(),
        );
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn receiving_aisle_to_dock() {
        let grid = Grid::generate(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let path = find_path(
            &grid,
            Position::new(3, 4),
            Position::new(3, 3),
            &Contention::none(),
        );
        assert_eq!(path, vec![Position::new(3, 4), Position::new(3, 3)]);
    }

    #[test]
    fn contention_forces_detour() {
        let grid = Grid::from_ascii(&[
            "#########",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#########",
        ]);
        let footprints = [Footprint {
            id: "other".into(),
            position: Position::new(4, 4),
            next_step: None,
        }];
        let start = Position::new(4, 2);
        let goal = Position::new(4, 6);
        let path = find_path(&grid, start, goal, &Contention::new(&footprints, "me"));
        assert!(!path.contains(&Position::new(4, 4)));
        assert!(is_valid_route(&grid, &path));
        assert!(path.len() as u32 - 1 > start.manhattan(&goal));
    }

    #[test]
    fn routes_never_beat_manhattan() {
        let grid = Grid::generate(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let pairs = [
            ((3, 4), (36, 4)),
            ((1, 1), (40, 28)),
            ((14, 10), (3, 25)),
            ((6, 2), (34, 23)),
        ];
        for ((sx, sy), (gx, gy)) in pairs {
            let start = Position::new(sx, sy);
            let goal = Position::new(gx, gy);
            let path = find_path(&grid, start, goal, &Contention::none());
            assert!(!path.is_empty(), "{start} -> {goal}");
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&goal));
            assert!(path.len() as u32 - 1 >= start.manhattan(&goal));
            assert!(is_valid_route(&grid, &path));
        }
    }
}
