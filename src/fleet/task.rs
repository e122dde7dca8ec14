use crate::clock::Timestamp;
use crate::grid::{CellKind, Position};
use crate::Id;

/// Safety margin applied to a material's weight.
pub const CAPACITY_MARGIN: f64 = 1.1;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub position: Position,
    /// Zone the location belongs to, when known.
    pub zone: Option<CellKind>,
    pub shelf_id: Option<String>,
}

impl Location {
    pub fn at(position: Position) -> Self {
        Self {
            position,
            zone: None,
            shelf_id: None,
        }
    }
}

/// Centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MaterialPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl MaterialPriority {
    /// Numeric task priority: 2, 5, 8, 10.
    pub fn value(self) -> u8 {
        match self {
            MaterialPriority::Low => 2,
            MaterialPriority::Medium => 5,
            MaterialPriority::High => 8,
            MaterialPriority::Urgent => 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub id: Id,
    pub name: String,
    /// Kilograms.
    pub weight: f64,
    pub dimensions: Dimensions,
    pub fragile: bool,
    pub priority: MaterialPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Picking,
    Carrying,
    Dropping,
    Completed,
}

impl TaskStatus {
    /// Neither waiting for a forklift nor finished.
    pub fn is_active(self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TaskCategory {
    /// Receiving dock to shelving.
    Inbound,
    /// Shelving to shipping dock.
    Outbound,
    /// Shelf to shelf.
    Internal,
}

/// A request to move one material from a pickup to a dropoff location.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    pub id: Id,
    pub pickup: Location,
    pub dropoff: Location,
    pub material: Material,
    pub priority: u8,
    pub status: TaskStatus,
    /// Manhattan distance pickup to dropoff, times two.
    pub estimated_time: u32,
    /// Milliseconds from assignment to completion.
    pub actual_time_ms: Option<u64>,
    pub assigned_forklift: Option<Id>,
    pub created_at: Timestamp,
    pub assigned_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    /// Material weight plus margin, rounded (kg).
    pub required_capacity: f64,
    pub category: Option<TaskCategory>,
}

impl Task {
    /// A pending task with derived priority, estimate and capacity.
    pub fn new(
        id: impl Into<Id>,
        pickup: Location,
        dropoff: Location,
        material: Material,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            priority: material.priority.value(),
            estimated_time: pickup.position.manhattan(&dropoff.position) * 2,
            required_capacity: (material.weight * CAPACITY_MARGIN).round(),
            pickup,
            dropoff,
            material,
            status: TaskStatus::Pending,
            actual_time_ms: None,
            assigned_forklift: None,
            created_at,
            assigned_at: None,
            started_at: None,
            completed_at: None,
            category: None,
        }
    }

    pub fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Free for assignment.
    pub fn is_open(&self) -> bool {
        self.status == TaskStatus::Pending && self.assigned_forklift.is_none()
    }

    /// Back to pending with no forklift.
    pub fn release(&mut self) {
        self.status = TaskStatus::Pending;
        self.assigned_forklift = None;
        self.assigned_at = None;
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(weight: f64, priority: MaterialPriority) -> Material {
        Material {
            id: "m".into(),
            name: "Lumber".into(),
            weight,
            dimensions: Dimensions::default(),
            fragile: false,
            priority,
        }
    }

    #[test]
    fn derived_fields() {
        let task = Task::new(
            "t",
            Location::at(Position::new(3, 3)),
            Location::at(Position::new(10, 7)),
            material(155.0, MaterialPriority::High),
            42,
        );
        assert_eq!(task.priority, 8);
        assert_eq!(task.estimated_time, 22);
        assert_eq!(task.required_capacity, 171.0);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.is_open());
    }

    #[test]
    fn priority_values() {
        assert_eq!(MaterialPriority::Low.value(), 2);
        assert_eq!(MaterialPriority::Medium.value(), 5);
        assert_eq!(MaterialPriority::Urgent.value(), 10);
    }

    #[test]
    fn active_statuses() {
        assert!(!TaskStatus::Pending.is_active());
        assert!(!TaskStatus::Completed.is_active());
        assert!(TaskStatus::Assigned.is_active());
        assert!(TaskStatus::Carrying.is_active());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
    }
}
