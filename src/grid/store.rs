//! Layout cache consulted by resets that keep the current warehouse layout.
//!
//! The simulation seeds the store whenever it generates or edits the grid,
//! and loads from it when asked to rebuild without regenerating.

use super::Grid;

/// Keyed slot holding the most recent warehouse layout.
pub trait GridStore: Send {
    /// Returns the cached layout, if any.
    fn load(&self) -> Option<Grid>;

    /// Replaces the cached layout.
    fn save(&mut self, grid: &Grid);

    /// Drops the cached layout.
    fn clear(&mut self);
}

/// In-process layout cache.
#[derive(Debug, Default, Clone)]
pub struct MemoryGridStore {
    slot: Option<Grid>,
}

impl MemoryGridStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GridStore for MemoryGridStore {
    fn load(&self) -> Option<Grid> {
        self.slot.clone()
    }

    fn save(&mut self, grid: &Grid) {
        self.slot = Some(grid.clone());
    }

    fn clear(&mut self) {
        self.slot = None;
    }
}

/// Layout cache holding the grid as serialized JSON text.
///
/// A slot that fails to parse is reported and treated as empty, so the
/// caller falls back to generating a fresh layout.
#[cfg(feature = "serde")]
#[derive(Debug, Default, Clone)]
pub struct JsonGridStore {
    slot: Option<String>,
}

#[cfg(feature = "serde")]
impl JsonGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with raw JSON text.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Some(raw.into()),
        }
    }

    /// Raw JSON currently held, if any.
    pub fn raw(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

#[cfg(feature = "serde")]
impl GridStore for JsonGridStore {
    fn load(&self) -> Option<Grid> {
        let raw = self.slot.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(grid) => Some(grid),
            Err(err) => {
                tracing::warn!(%err, "failed to parse stored grid, a new one will be generated");
                None
            }
        }
    }

    fn save(&mut self, grid: &Grid) {
        match serde_json::to_string(grid) {
            Ok(raw) => self.slot = Some(raw),
            Err(err) => tracing::warn!(%err, "failed to serialize grid for the layout cache"),
        }
    }

    fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellKind, Position};

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryGridStore::new();
        assert!(store.load().is_none());
        let grid = Grid::from_ascii(&["#.s"]);
        store.save(&grid);
        assert_eq!(store.load(), Some(grid));
        store.clear();
        assert!(store.load().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_store_keeps_edits() {
        let mut store = JsonGridStore::new();
        let mut grid = Grid::generate(20, 20);
        assert!(grid.add_obstacle(Position::new(1, 1)));
        store.save(&grid);
        assert!(store.raw().is_some());
        let loaded = store.load().unwrap();
        assert_eq!(loaded.kind(Position::new(1, 1)), Some(CellKind::Obstacle));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_store_ignores_garbage() {
        let store = JsonGridStore::from_raw("{not json");
        assert!(store.load().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_store_rejects_mismatched_dimensions() {
        let mut value = serde_json::to_value(Grid::generate(20, 20)).unwrap();
        value["width"] = serde_json::json!(40);
        let store = JsonGridStore::from_raw(value.to_string());
        assert!(store.load().is_none());
    }
}
