//! Deterministic warehouse layout.
//!
//! The layout never uses randomness: the same dimensions always produce the
//! same grid. Zones, from top to bottom:
//!
//! - receiving block (top-left) and shipping block (top-right), each split by
//!   an aisle column and the row `y = 4`;
//! - a main horizontal aisle at `y = 6`;
//! - shelf blocks separated by aisle columns every 7th column, with one inner
//!   aisle column per block;
//! - a main horizontal aisle at `y = h - 7`;
//! - a charging band near the bottom wall.

use super::{Cell, CellKind, Grid, Position};

/// Default warehouse width in cells.
pub const DEFAULT_WIDTH: usize = 42;
/// Default warehouse height in cells.
pub const DEFAULT_HEIGHT: usize = 30;

impl Grid {
    /// Generates the fixed warehouse layout for the given dimensions.
    pub fn generate(width: usize, height: usize) -> Self {
        let mut grid = Grid::filled(width, height, CellKind::Empty);
        let w = width as i32;
        let h = height as i32;

        for y in 0..h {
            for x in 0..w {
                let kind = classify(x, y, w, h);
                if let Some(cell) = grid.cell_mut(Position::new(x, y)) {
                    *cell = Cell::new(kind);
                }
            }
        }

        // Cross corridor through the middle of the shelving.
        let mid = h / 2;
        if mid >= 2 && mid < h - 2 {
            for x in (2..w - 2).step_by(4) {
                open(&mut grid, Position::new(x, mid));
            }
        }

        // Extra access columns into the receiving and shipping blocks.
        for y in 1..=4 {
            if y < h - 1 {
                open(&mut grid, Position::new(6, y));
                open(&mut grid, Position::new(w - 6, y));
            }
        }

        grid
    }
}

fn open(grid: &mut Grid, pos: Position) {
    if let Some(cell) = grid.cell_mut(pos) {
        *cell = Cell::new(CellKind::Empty);
    }
}

fn classify(x: i32, y: i32, w: i32, h: i32) -> CellKind {
    if y == 0 || y == h - 1 || x == 0 || x == w - 1 {
        return CellKind::Obstacle;
    }
    if x == 1 || x == w - 2 {
        return CellKind::Empty;
    }
    if (2..=5).contains(&y) && (3..=12).contains(&x) {
        return if x == 7 || y == 4 {
            CellKind::Empty
        } else {
            CellKind::Receiving
        };
    }
    if (2..=5).contains(&y) && (w - 13..=w - 3).contains(&x) {
        return if x == w - 8 || y == 4 {
            CellKind::Empty
        } else {
            CellKind::Shipping
        };
    }
    if (h - 6..=h - 3).contains(&y) && (3..=w - 4).contains(&x) {
        return CellKind::Charging;
    }
    let interior_column = x > 2 && x < w - 2;
    if y == 6 || y == h - 7 || (interior_column && x % 7 == 0) {
        return CellKind::Empty;
    }
    if y > 6 && y < h - 7 && interior_column {
        return if (x - 3) % 7 == 3 {
            CellKind::Empty
        } else {
            CellKind::Shelf
        };
    }
    CellKind::Empty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_grid() -> Grid {
        Grid::generate(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(default_grid(), default_grid());
    }

    #[test]
    fn perimeter_is_walled() {
        let grid = default_grid();
        for x in 0..DEFAULT_WIDTH as i32 {
            assert_eq!(grid.kind(Position::new(x, 0)), Some(CellKind::Obstacle));
            assert_eq!(grid.kind(Position::new(x, 29)), Some(CellKind::Obstacle));
        }
        for y in 0..DEFAULT_HEIGHT as i32 {
            assert_eq!(grid.kind(Position::new(0, y)), Some(CellKind::Obstacle));
            assert_eq!(grid.kind(Position::new(41, y)), Some(CellKind::Obstacle));
        }
    }

    #[test]
    fn receiving_and_shipping_blocks() {
        let grid = default_grid();
        assert_eq!(grid.kind(Position::new(3, 3)), Some(CellKind::Receiving));
        assert_eq!(grid.kind(Position::new(3, 4)), Some(CellKind::Empty));
        assert_eq!(grid.kind(Position::new(7, 3)), Some(CellKind::Empty));
        assert_eq!(grid.kind(Position::new(6, 2)), Some(CellKind::Empty));
        assert_eq!(grid.kind(Position::new(30, 3)), Some(CellKind::Shipping));
        assert_eq!(grid.kind(Position::new(34, 3)), Some(CellKind::Empty));
        assert_eq!(grid.kind(Position::new(36, 2)), Some(CellKind::Empty));
    }

    #[test]
    fn shelves_and_aisles() {
        let grid = default_grid();
        assert_eq!(grid.kind(Position::new(10, 10)), Some(CellKind::Shelf));
        assert_eq!(grid.kind(Position::new(9, 10)), Some(CellKind::Shelf));
        // every 7th column is an aisle
        assert_eq!(grid.kind(Position::new(14, 10)), Some(CellKind::Empty));
        // inner aisle column of a block
        assert_eq!(grid.kind(Position::new(13, 10)), Some(CellKind::Empty));
        // main horizontal aisles
        assert_eq!(grid.kind(Position::new(10, 6)), Some(CellKind::Empty));
        assert_eq!(grid.kind(Position::new(10, 23)), Some(CellKind::Empty));
        // cross corridor at mid height
        assert_eq!(grid.kind(Position::new(10, 15)), Some(CellKind::Empty));
        assert_eq!(grid.kind(Position::new(10, 14)), Some(CellKind::Shelf));
    }

    #[test]
    fn charging_band() {
        let grid = default_grid();
        assert_eq!(grid.kind(Position::new(10, 25)), Some(CellKind::Charging));
        assert_eq!(grid.kind(Position::new(38, 27)), Some(CellKind::Charging));
        assert!(grid.count(CellKind::Charging) > 0);
    }

    #[test]
    fn small_grids_do_not_panic() {
        let grid = Grid::generate(5, 5);
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.kind(Position::new(0, 0)), Some(CellKind::Obstacle));
    }
}
