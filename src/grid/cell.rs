use std::fmt;

use crate::Id;

/// Kind of a grid tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CellKind {
    Empty,
    Shelf,
    Obstacle,
    Docking,
    Charging,
    Restricted,
    Receiving,
    Shipping,
}

impl CellKind {
    /// Forklifts may only drive over empty, docking, charging, receiving and
    /// shipping cells. Shelves and obstacles are never traversable.
    pub fn is_traversable(self) -> bool {
        matches!(
            self,
            CellKind::Empty
                | CellKind::Docking
                | CellKind::Charging
                | CellKind::Receiving
                | CellKind::Shipping
        )
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CellKind::Empty => "empty",
            CellKind::Shelf => "shelf",
            CellKind::Obstacle => "obstacle",
            CellKind::Docking => "docking",
            CellKind::Charging => "charging",
            CellKind::Restricted => "restricted",
            CellKind::Receiving => "receiving",
            CellKind::Shipping => "shipping",
        };
        f.write_str(s)
    }
}

/// One grid tile.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub kind: CellKind,
    /// Obstacles are always occupied; other cells while a forklift stands on them.
    pub occupied: bool,
    pub occupied_by: Option<Id>,
    /// Stock label for shelves.
    pub item: Option<String>,
    /// Stored weight (kg) for shelves.
    pub weight: Option<f64>,
}

impl Cell {
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            occupied: kind == CellKind::Obstacle,
            occupied_by: None,
            item: None,
            weight: None,
        }
    }
}
