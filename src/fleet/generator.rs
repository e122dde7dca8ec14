//! Random work and the default fleet roster.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Dimensions, Forklift, ForkliftStatus, Location, Material, MaterialPriority, Task, TaskCategory};
use crate::clock::Timestamp;
use crate::grid::{CellKind, Grid, Position};

/// `(name, base weight kg, fragile)`.
const CATALOGUE: [(&str, f64, bool); 10] = [
    ("Steel Pipes", 200.0, false),
    ("Glass Panels", 50.0, true),
    ("Electronics", 30.0, true),
    ("Lumber", 150.0, false),
    ("Machinery Parts", 300.0, false),
    ("Chemicals", 100.0, true),
    ("Textiles", 25.0, false),
    ("Food Products", 75.0, false),
    ("Auto Parts", 120.0, false),
    ("Medical Supplies", 40.0, true),
];

const PRIORITIES: [MaterialPriority; 4] = [
    MaterialPriority::Low,
    MaterialPriority::Medium,
    MaterialPriority::High,
    MaterialPriority::Urgent,
];

const CATEGORIES: [TaskCategory; 3] = [
    TaskCategory::Inbound,
    TaskCategory::Outbound,
    TaskCategory::Internal,
];

/// Random probes before falling back to a row-major scan.
const PLACEMENT_ATTEMPTS: usize = 100;

const STARTING_POSITIONS: [Position; 5] = [
    Position::new(3, 4),
    Position::new(6, 4),
    Position::new(9, 4),
    Position::new(12, 4),
    Position::new(15, 4),
];
const OPERATORS: [&str; 5] = [
    "John Smith",
    "Sarah Johnson",
    "Mike Davis",
    "Lisa Wilson",
    "David Brown",
];
const CAPACITIES: [f64; 5] = [1000.0, 1200.0, 800.0, 1500.0, 1000.0];

/// The standard roster: `forklift-1..=count` on the receiving aisle, logged
/// out and offline.
pub fn default_fleet(count: usize, now: Timestamp) -> Vec<Forklift> {
    (0..count)
        .map(|i| {
            let slot = i % STARTING_POSITIONS.len();
            let mut f = Forklift::new(
                format!("forklift-{}", i + 1),
                OPERATORS[slot],
                STARTING_POSITIONS[slot],
                CAPACITIES[slot],
                now,
            );
            f.status = ForkliftStatus::Offline;
            f.is_logged_in = false;
            f.last_login_time = None;
            f
        })
        .collect()
}

/// Seeded source of random materials and tasks.
#[derive(Debug)]
pub struct TaskGenerator {
    rng: StdRng,
    next_task: u64,
    next_material: u64,
}

impl TaskGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_task: 1,
            next_material: 1,
        }
    }

    /// Picks a catalogue entry and scales its weight by 0.5x to 1.5x.
    pub fn random_material(&mut self) -> Material {
        let (name, base, fragile) = CATALOGUE[self.rng.gen_range(0..CATALOGUE.len())];
        let id = format!("mat-{}", self.next_material);
        self.next_material += 1;
        Material {
            id,
            name: name.to_string(),
            weight: (base * self.rng.gen_range(0.5..1.5)).round(),
            dimensions: Dimensions {
                length: self.rng.gen_range(50.0..150.0_f64).round(),
                width: self.rng.gen_range(30.0..100.0_f64).round(),
                height: self.rng.gen_range(20.0..100.0_f64).round(),
            },
            fragile,
            priority: PRIORITIES[self.rng.gen_range(0..PRIORITIES.len())],
        }
    }

    /// One pending task, or `None` if the grid has no usable cells.
    ///
    /// Inbound work runs from receiving to a shelf aisle, outbound from a
    /// shelf aisle to shipping, internal between shelf aisles.
    pub fn random_task(&mut self, grid: &Grid, now: Timestamp) -> Option<Task> {
        let material = self.random_material();
        let category = CATEGORIES[self.rng.gen_range(0..CATEGORIES.len())];
        let (pickup, dropoff) = match category {
            TaskCategory::Inbound => (
                self.random_position(grid, CellKind::Receiving, false)?,
                self.random_position(grid, CellKind::Empty, true)?,
            ),
            TaskCategory::Outbound => (
                self.random_position(grid, CellKind::Empty, true)?,
                self.random_position(grid, CellKind::Shipping, false)?,
            ),
            TaskCategory::Internal => (
                self.random_position(grid, CellKind::Empty, true)?,
                self.random_position(grid, CellKind::Empty, true)?,
            ),
        };

        let pickup = Location {
            position: pickup,
            zone: Some(if category == TaskCategory::Inbound {
                CellKind::Receiving
            } else {
                CellKind::Shelf
            }),
            shelf_id: (category != TaskCategory::Inbound).then(|| self.shelf_id()),
        };
        let dropoff = Location {
            position: dropoff,
            zone: Some(if category == TaskCategory::Outbound {
                CellKind::Shipping
            } else {
                CellKind::Shelf
            }),
            shelf_id: (category != TaskCategory::Outbound).then(|| self.shelf_id()),
        };

        let id = format!("task-{}", self.next_task);
        self.next_task += 1;
        Some(Task::new(id, pickup, dropoff, material, now).with_category(category))
    }

    /// Up to `count` tasks; cells that cannot be placed are skipped.
    pub fn random_tasks(&mut self, count: usize, grid: &Grid, now: Timestamp) -> Vec<Task> {
        (0..count)
            .filter_map(|_| self.random_task(grid, now))
            .collect()
    }

    fn shelf_id(&mut self) -> String {
        format!("S{}", self.rng.gen_range(0..100))
    }

    fn random_position(&mut self, grid: &Grid, kind: CellKind, near_shelves: bool) -> Option<Position> {
        let (w, h) = (grid.width() as i32, grid.height() as i32);
        if w > 2 && h > 2 {
            for _ in 0..PLACEMENT_ATTEMPTS {
                let pos = Position::new(self.rng.gen_range(1..w - 1), self.rng.gen_range(1..h - 1));
                if grid.kind(pos) != Some(kind) {
                    continue;
                }
                if near_shelves && kind == CellKind::Empty && !beside_shelf(grid, pos) {
                    continue;
                }
                return Some(pos);
            }
        }
        // Any interior cell a forklift can load at.
        (1..h - 1)
            .flat_map(|y| (1..w - 1).map(move |x| Position::new(x, y)))
            .find(|p| {
                matches!(
                    grid.kind(*p),
                    Some(CellKind::Empty | CellKind::Receiving | CellKind::Shipping)
                )
            })
    }
}

fn beside_shelf(grid: &Grid, pos: Position) -> bool {
    pos.neighbors()
        .iter()
        .any(|n| grid.kind(*n) == Some(CellKind::Shelf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

    #[test]
    fn default_fleet_layout() {
        let fleet = default_fleet(5, 7);
        assert_eq!(fleet.len(), 5);
        assert_eq!(fleet[0].id, "forklift-1");
        assert_eq!(fleet[0].operator_name, "John Smith");
        assert_eq!(fleet[0].position, Position::new(3, 4));
        assert_eq!(fleet[3].capacity, 1500.0);
        assert!(fleet.iter().all(|f| f.status == ForkliftStatus::Offline && !f.is_logged_in));
    }

    #[test]
    fn same_seed_same_tasks() {
        let grid = Grid::generate(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let a = TaskGenerator::new(9).random_tasks(5, &grid, 0);
        let b = TaskGenerator::new(9).random_tasks(5, &grid, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn tasks_land_on_traversable_cells() {
        let grid = Grid::generate(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let mut generator = TaskGenerator::new(3);
        let tasks = generator.random_tasks(30, &grid, 0);
        assert_eq!(tasks.len(), 30);
        for t in &tasks {
            assert!(grid.is_traversable(t.pickup.position), "{:?}", t.pickup);
            assert!(grid.is_traversable(t.dropoff.position), "{:?}", t.dropoff);
            match t.category {
                Some(TaskCategory::Inbound) => {
                    assert_eq!(grid.kind(t.pickup.position), Some(CellKind::Receiving));
                    assert!(t.pickup.shelf_id.is_none());
                }
                Some(TaskCategory::Outbound) => {
                    assert_eq!(grid.kind(t.dropoff.position), Some(CellKind::Shipping));
                    assert!(t.dropoff.shelf_id.is_none());
                }
                _ => {}
            }
        }
        let ids: std::collections::HashSet<_> = tasks.iter().map(|t| &t.id).collect();
        assert_eq!(ids.len(), tasks.len());
    }

    #[test]
    fn material_weight_within_scale() {
        let mut generator = TaskGenerator::new(11);
        for _ in 0..50 {
            let m = generator.random_material();
            let base = CATALOGUE
                .iter()
                .find(|(name, _, _)| *name == m.name)
                .map(|(_, w, _)| *w)
                .unwrap();
            assert!(m.weight >= (base * 0.5).round() && m.weight <= (base * 1.5).round());
        }
    }

    #[test]
    fn falls_back_when_kind_is_missing() {
        // no receiving cells: inbound pickups fall back to the first usable cell
        let grid = Grid::from_ascii(&["#####", "#...#", "#####"]);
        let mut generator = TaskGenerator::new(1);
        let pos = generator.random_position(&grid, CellKind::Receiving, false);
        assert_eq!(pos, Some(Position::new(1, 1)));
    }

    #[test]
    fn no_usable_cells_means_no_task() {
        let grid = Grid::from_ascii(&["###", "###", "###"]);
        let mut generator = TaskGenerator::new(1);
        assert!(generator.random_task(&grid, 0).is_none());
    }
}
