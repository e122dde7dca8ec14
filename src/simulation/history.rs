//! Write-behind record of completed tasks.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::Timestamp;
use crate::fleet::Task;
use crate::grid::Position;
use crate::Id;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskHistoryRecord {
    pub task_id: Id,
    pub forklift_id: Id,
    pub material: String,
    pub weight: f64,
    pub pickup: Position,
    pub dropoff: Position,
    pub assigned_at: Option<Timestamp>,
    pub completed_at: Timestamp,
    pub actual_time_ms: u64,
}

impl TaskHistoryRecord {
    pub fn completed(task: &Task, forklift_id: &str, completed_at: Timestamp, actual_time_ms: u64) -> Self {
        Self {
            task_id: task.id.clone(),
            forklift_id: forklift_id.to_string(),
            material: task.material.name.clone(),
            weight: task.material.weight,
            pickup: task.pickup.position,
            dropoff: task.dropoff.position,
            assigned_at: task.assigned_at,
            completed_at,
            actual_time_ms,
        }
    }
}

/// Receives a record for every completed task. The scheduler never reads
/// it back.
pub trait HistorySink: Send {
    fn record(&mut self, record: TaskHistoryRecord);
}

/// Shared in-memory history. Clones see the same records, so a caller can
/// keep a handle after moving one into the simulation.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    records: Arc<Mutex<Vec<TaskHistoryRecord>>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TaskHistoryRecord> {
        self.records.lock().clone()
    }

    /// Records for one task, newest first.
    pub fn for_task(&self, task_id: &str) -> Vec<TaskHistoryRecord> {
        let mut out: Vec<_> = self
            .records
            .lock()
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        out
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl HistorySink for MemoryHistory {
    fn record(&mut self, record: TaskHistoryRecord) {
        self.records.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(task: &str, at: Timestamp) -> TaskHistoryRecord {
        TaskHistoryRecord {
            task_id: task.into(),
            forklift_id: "forklift-1".into(),
            material: "Lumber".into(),
            weight: 150.0,
            pickup: Position::new(3, 3),
            dropoff: Position::new(8, 7),
            assigned_at: Some(0),
            completed_at: at,
            actual_time_ms: at,
        }
    }

    #[test]
    fn clones_share_records() {
        let handle = MemoryHistory::new();
        let mut sink = handle.clone();
        sink.record(record("a", 10));
        sink.record(record("b", 20));
        sink.record(record("a", 30));
        assert_eq!(handle.len(), 3);
        let a = handle.for_task("a");
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].completed_at, 30);
    }
}
