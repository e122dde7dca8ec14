use std::fmt;

use crate::algorithms::pathfinding::Footprint;
use crate::clock::Timestamp;
use crate::grid::Position;
use crate::Id;

use super::task::Material;

/// Fuel and battery levels of a freshly fuelled forklift.
pub const FULL_LEVEL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ForkliftStatus {
    Idle,
    Moving,
    Picking,
    Carrying,
    Dropping,
    Stuck,
    Emergency,
    Offline,
}

impl ForkliftStatus {
    /// Statuses in which the forklift follows its path.
    pub fn is_travelling(self) -> bool {
        matches!(self, ForkliftStatus::Moving | ForkliftStatus::Carrying)
    }
}

impl fmt::Display for ForkliftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ForkliftStatus::Idle => "idle",
            ForkliftStatus::Moving => "moving",
            ForkliftStatus::Picking => "picking",
            ForkliftStatus::Carrying => "carrying",
            ForkliftStatus::Dropping => "dropping",
            ForkliftStatus::Stuck => "stuck",
            ForkliftStatus::Emergency => "emergency",
            ForkliftStatus::Offline => "offline",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MaintenanceStatus {
    #[default]
    Good,
    Warning,
    Critical,
}

/// A forklift on the warehouse floor.
///
/// `path[0]` is the current cell while a route is active. The task itself
/// lives in the [`Registry`](super::Registry); the forklift only holds its id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Forklift {
    pub id: Id,
    pub operator_name: String,
    pub position: Position,
    pub current_task: Option<Id>,
    /// Percent, `[0, 100]`.
    pub fuel_level: f64,
    /// Percent, `[0, 100]`.
    pub battery_level: f64,
    /// Kilograms.
    pub capacity: f64,
    /// Kilograms.
    pub current_load: f64,
    pub status: ForkliftStatus,
    pub path: Vec<Position>,
    /// Cells travelled.
    pub total_distance: u32,
    /// Time spent moving (ms).
    pub total_time_ms: u64,
    pub tasks_completed: u32,
    pub last_move_time: Timestamp,
    pub is_blocked: bool,
    pub blockage_reason: Option<String>,
    pub speed: f64,
    pub maintenance_status: MaintenanceStatus,
    pub is_logged_in: bool,
    pub last_login_time: Option<Timestamp>,
}

impl Forklift {
    /// A fuelled, logged-in, idle forklift.
    pub fn new(
        id: impl Into<Id>,
        operator_name: impl Into<String>,
        position: Position,
        capacity: f64,
        now: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            operator_name: operator_name.into(),
            position,
            current_task: None,
            fuel_level: FULL_LEVEL,
            battery_level: FULL_LEVEL,
            capacity,
            current_load: 0.0,
            status: ForkliftStatus::Idle,
            path: Vec::new(),
            total_distance: 0,
            total_time_ms: 0,
            tasks_completed: 0,
            last_move_time: now,
            is_blocked: false,
            blockage_reason: None,
            speed: 1.0,
            maintenance_status: MaintenanceStatus::Good,
            is_logged_in: true,
            last_login_time: Some(now),
        }
    }

    /// Returns true if `material` fits on top of the current load.
    pub fn can_carry(&self, material: &Material) -> bool {
        self.current_load + material.weight <= self.capacity
    }

    pub fn is_overloaded(&self) -> bool {
        self.current_load > self.capacity
    }

    /// The next cell on the route, if any.
    pub fn next_step(&self) -> Option<Position> {
        self.path.get(1).copied()
    }

    /// Fuel burnt since the tank was last full.
    pub fn fuel_consumed(&self) -> f64 {
        (FULL_LEVEL - self.fuel_level).max(0.0)
    }

    /// Burns fuel and battery, flooring both at zero.
    pub fn drain(&mut self, fuel: f64, battery: f64) {
        self.fuel_level = (self.fuel_level - fuel).max(0.0);
        self.battery_level = (self.battery_level - battery).max(0.0);
    }

    /// Sets down `weight` kilograms, flooring the load at zero.
    pub fn unload(&mut self, weight: f64) {
        self.current_load = (self.current_load - weight).max(0.0);
    }

    /// Drops the route and becomes idle.
    pub fn go_idle(&mut self) {
        self.status = ForkliftStatus::Idle;
        self.path.clear();
    }

    pub fn clear_blockage(&mut self) {
        self.is_blocked = false;
        self.blockage_reason = None;
    }

    pub fn footprint(&self) -> Footprint {
        Footprint {
            id: self.id.clone(),
            position: self.position,
            next_step: self.next_step(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{Dimensions, MaterialPriority};

    fn material(weight: f64) -> Material {
        Material {
            id: "m".into(),
            name: "Steel Pipes".into(),
            weight,
            dimensions: Dimensions::default(),
            fragile: false,
            priority: MaterialPriority::Medium,
        }
    }

    #[test]
    fn capacity_check_is_inclusive() {
        let mut f = Forklift::new("f", "Op", Position::new(1, 1), 1000.0, 0);
        assert!(f.can_carry(&material(1000.0)));
        assert!(!f.can_carry(&material(1000.5)));
        f.current_load = 400.0;
        assert!(f.can_carry(&material(600.0)));
        assert!(!f.can_carry(&material(601.0)));
    }

    #[test]
    fn drain_floors_at_zero() {
        let mut f = Forklift::new("f", "Op", Position::new(1, 1), 1000.0, 0);
        f.fuel_level = 0.05;
        f.drain(0.1, 0.08);
        assert_eq!(f.fuel_level, 0.0);
        assert!((f.battery_level - 99.92).abs() < 1e-9);
        assert!((f.fuel_consumed() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn footprint_reports_next_step() {
        let mut f = Forklift::new("f", "Op", Position::new(1, 1), 1000.0, 0);
        assert_eq!(f.footprint().next_step, None);
        f.path = vec![Position::new(1, 1), Position::new(2, 1)];
        assert_eq!(f.footprint().next_step, Some(Position::new(2, 1)));
    }

    #[test]
    fn unload_floors_at_zero() {
        let mut f = Forklift::new("f", "Op", Position::new(1, 1), 1000.0, 0);
        f.current_load = 50.0;
        f.unload(80.0);
        assert_eq!(f.current_load, 0.0);
    }
}
