//! Warehouse grid model.
//!
//! A fixed-size 2D array of typed cells. Cell kinds change only through the
//! explicit edit operations ([`Grid::add_obstacle`], [`Grid::add_shelf`],
//! [`Grid::remove_shelf`]); the scheduler only refreshes occupancy.

mod cell;
mod layout;
mod position;
pub mod store;

pub use cell::{Cell, CellKind};
pub use layout::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use position::Position;
pub use store::{GridStore, MemoryGridStore};

#[cfg(feature = "serde")]
pub use store::JsonGridStore;

use thiserror::Error;

use crate::Id;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid is {width}x{height} but holds {cells} cells")]
    CellCount {
        width: usize,
        height: usize,
        cells: usize,
    },
}

/// Rectangular warehouse layout stored row-major.
///
/// Deserialization rejects a cell list that does not match the dimensions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawGrid"))]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

/// Serialized form of a [`Grid`] before its dimensions are checked.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let RawGrid {
            width,
            height,
            cells,
        } = raw;
        if width.checked_mul(height) != Some(cells.len()) {
            return Err(GridError::CellCount {
                width,
                height,
                cells: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }
}

impl Grid {
    /// Creates a grid where every cell has the given kind.
    pub fn filled(width: usize, height: usize, kind: CellKind) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::new(kind); width * height],
        }
    }

    /// Builds a grid from ASCII rows, top row first.
    ///
    /// `#` obstacle, `.` empty, `s` shelf, `d` docking, `c` charging,
    /// `x` restricted, `r` receiving, `p` shipping. Unknown characters map to
    /// empty. Short rows are padded with empty cells.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Self::filled(width, height, CellKind::Empty);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let kind = match ch {
                    '#' => CellKind::Obstacle,
                    's' => CellKind::Shelf,
                    'd' => CellKind::Docking,
                    'c' => CellKind::Charging,
                    'x' => CellKind::Restricted,
                    'r' => CellKind::Receiving,
                    'p' => CellKind::Shipping,
                    _ => CellKind::Empty,
                };
                grid.cells[y * width + x] = Cell::new(kind);
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns true if the position lies inside the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y as usize * self.width + pos.x as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.index(pos).map(move |i| &mut self.cells[i])
    }

    /// Kind of the cell at `pos`, if in bounds.
    pub fn kind(&self, pos: Position) -> Option<CellKind> {
        self.cell(pos).map(|c| c.kind)
    }

    /// A forklift may stand on or pass through `pos`.
    pub fn is_traversable(&self, pos: Position) -> bool {
        self.kind(pos).is_some_and(CellKind::is_traversable)
    }

    /// In-bounds traversable 4-neighbours of `pos`, in up/right/down/left order.
    pub fn traversable_neighbors(&self, pos: Position) -> Vec<Position> {
        pos.neighbors()
            .into_iter()
            .filter(|n| self.is_traversable(*n))
            .collect()
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| Position::new(x as i32, y as i32))
        })
    }

    /// Number of cells of the given kind.
    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|c| c.kind == kind).count()
    }

    /// Turns the cell into an obstacle. Returns false if out of bounds or
    /// already an obstacle.
    pub fn add_obstacle(&mut self, pos: Position) -> bool {
        match self.cell_mut(pos) {
            Some(cell) if cell.kind != CellKind::Obstacle => {
                *cell = Cell::new(CellKind::Obstacle);
                true
            }
            _ => false,
        }
    }

    /// Places a shelf on an empty cell. `label` becomes the cell's item tag.
    pub fn add_shelf(&mut self, pos: Position, label: impl Into<String>) -> bool {
        match self.cell_mut(pos) {
            Some(cell) if cell.kind == CellKind::Empty => {
                *cell = Cell {
                    item: Some(label.into()),
                    weight: Some(0.0),
                    ..Cell::new(CellKind::Shelf)
                };
                true
            }
            _ => false,
        }
    }

    /// Clears a shelf back to an empty cell.
    pub fn remove_shelf(&mut self, pos: Position) -> bool {
        match self.cell_mut(pos) {
            Some(cell) if cell.kind == CellKind::Shelf => {
                *cell = Cell::new(CellKind::Empty);
                true
            }
            _ => false,
        }
    }

    /// Refreshes occupancy on every non-obstacle cell from forklift positions.
    pub fn sync_occupancy<'a, I>(&mut self, forklifts: I)
    where
        I: IntoIterator<Item = (&'a Id, Position)>,
    {
        for cell in self.cells.iter_mut() {
            if cell.kind != CellKind::Obstacle {
                cell.occupied = false;
                cell.occupied_by = None;
            }
        }
        for (id, pos) in forklifts {
            if let Some(cell) = self.cell_mut(pos) {
                if cell.kind != CellKind::Obstacle {
                    cell.occupied = true;
                    cell.occupied_by = Some(id.clone());
                }
            }
        }
    }
}
