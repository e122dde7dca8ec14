use std::collections::HashSet;

use thiserror::Error;

use super::{Forklift, Task};
use crate::Id;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Forklift ID already exists: {0}")]
    DuplicateForklift(Id),

    #[error("Task ID already exists: {0}")]
    DuplicateTask(Id),

    #[error("Unknown forklift: {0}")]
    ForkliftNotFound(Id),

    #[error("Unknown task: {0}")]
    TaskNotFound(Id),

    #[error("Registry invariant violated: {0}")]
    InvariantViolated(String),
}

/// Owns every forklift and task. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub(crate) forklifts: Vec<Forklift>,
    pub(crate) tasks: Vec<Task>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry, rejecting duplicate ids.
    pub fn with(forklifts: Vec<Forklift>, tasks: Vec<Task>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for f in forklifts {
            registry.add_forklift(f)?;
        }
        for t in tasks {
            registry.add_task(t)?;
        }
        Ok(registry)
    }

    pub fn forklifts(&self) -> &[Forklift] {
        &self.forklifts
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn forklift(&self, id: &str) -> Option<&Forklift> {
        self.forklifts.iter().find(|f| f.id == id)
    }

    pub fn forklift_mut(&mut self, id: &str) -> Option<&mut Forklift> {
        self.forklifts.iter_mut().find(|f| f.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn require_forklift(&self, id: &str) -> Result<&Forklift, RegistryError> {
        self.forklift(id)
            .ok_or_else(|| RegistryError::ForkliftNotFound(id.to_string()))
    }

    pub fn require_forklift_mut(&mut self, id: &str) -> Result<&mut Forklift, RegistryError> {
        self.forklift_mut(id)
            .ok_or_else(|| RegistryError::ForkliftNotFound(id.to_string()))
    }

    pub fn require_task(&self, id: &str) -> Result<&Task, RegistryError> {
        self.task(id)
            .ok_or_else(|| RegistryError::TaskNotFound(id.to_string()))
    }

    pub fn add_forklift(&mut self, forklift: Forklift) -> Result<(), RegistryError> {
        if self.forklift(&forklift.id).is_some() {
            return Err(RegistryError::DuplicateForklift(forklift.id));
        }
        self.forklifts.push(forklift);
        Ok(())
    }

    pub fn remove_forklift(&mut self, id: &str) -> Result<Forklift, RegistryError> {
        let idx = self
            .forklifts
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| RegistryError::ForkliftNotFound(id.to_string()))?;
        Ok(self.forklifts.remove(idx))
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), RegistryError> {
        if self.task(&task.id).is_some() {
            return Err(RegistryError::DuplicateTask(task.id));
        }
        self.tasks.push(task);
        Ok(())
    }

    /// The forklift whose `current_task` is `task_id`.
    pub fn holder_of(&self, task_id: &str) -> Option<&Forklift> {
        self.forklifts
            .iter()
            .find(|f| f.current_task.as_deref() == Some(task_id))
    }

    /// Tasks not yet completed.
    pub fn open_task_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status != super::TaskStatus::Completed)
            .count()
    }

    /// Checks the structural invariants that hold between ticks.
    ///
    /// * forklift and task ids are unique;
    /// * every `current_task` names an existing task;
    /// * no task is held by two forklifts;
    /// * an active task held by a forklift names that forklift;
    /// * fuel and battery stay within `[0, 100]`.
    pub fn check_invariants(&self) -> Result<(), RegistryError> {
        let violation = |msg: String| Err(RegistryError::InvariantViolated(msg));

        let mut seen = HashSet::new();
        for f in &self.forklifts {
            if !seen.insert(f.id.as_str()) {
                return violation(format!("duplicate forklift {}", f.id));
            }
            if !(0.0..=100.0).contains(&f.fuel_level) || !(0.0..=100.0).contains(&f.battery_level)
            {
                return violation(format!("forklift {} has levels out of range", f.id));
            }
        }

        let mut seen = HashSet::new();
        for t in &self.tasks {
            if !seen.insert(t.id.as_str()) {
                return violation(format!("duplicate task {}", t.id));
            }
        }

        let mut held = HashSet::new();
        for f in &self.forklifts {
            let Some(task_id) = f.current_task.as_deref() else {
                continue;
            };
            let Some(task) = self.task(task_id) else {
                return violation(format!("forklift {} holds unknown task {task_id}", f.id));
            };
            if !held.insert(task_id) {
                return violation(format!("task {task_id} is held by more than one forklift"));
            }
            if task.status.is_active() && task.assigned_forklift.as_deref() != Some(f.id.as_str())
            {
                return violation(format!(
                    "task {task_id} is held by {} but assigned to {:?}",
                    f.id, task.assigned_forklift
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{Dimensions, Location, Material, MaterialPriority, TaskStatus};
    use crate::grid::Position;

    fn forklift(id: &str) -> Forklift {
        Forklift::new(id, "Op", Position::new(1, 1), 1000.0, 0)
    }

    fn task(id: &str) -> Task {
        Task::new(
            id,
            Location::at(Position::new(1, 1)),
            Location::at(Position::new(2, 2)),
            Material {
                id: "m".into(),
                name: "Textiles".into(),
                weight: 20.0,
                dimensions: Dimensions::default(),
                fragile: false,
                priority: MaterialPriority::Low,
            },
            0,
        )
    }

    #[test]
    fn rejects_duplicates() {
        let mut r = Registry::new();
        r.add_forklift(forklift("a")).unwrap();
        assert_eq!(
            r.add_forklift(forklift("a")),
            Err(RegistryError::DuplicateForklift("a".into()))
        );
        r.add_task(task("t")).unwrap();
        assert_eq!(
            r.add_task(task("t")),
            Err(RegistryError::DuplicateTask("t".into()))
        );
    }

    #[test]
    fn remove_unknown_forklift() {
        let mut r = Registry::new();
        assert_eq!(
            r.remove_forklift("ghost").unwrap_err(),
            RegistryError::ForkliftNotFound("ghost".into())
        );
    }

    #[test]
    fn holder_lookup() {
        let mut a = forklift("a");
        a.current_task = Some("t".into());
        let r = Registry::with(vec![forklift("b"), a], vec![task("t")]).unwrap();
        assert_eq!(r.holder_of("t").map(|f| f.id.as_str()), Some("a"));
        assert!(r.holder_of("other").is_none());
    }

    #[test]
    fn double_holder_is_a_violation() {
        let mut a = forklift("a");
        a.current_task = Some("t".into());
        let mut b = forklift("b");
        b.current_task = Some("t".into());
        let r = Registry::with(vec![a, b], vec![task("t")]).unwrap();
        assert!(matches!(
            r.check_invariants(),
            Err(RegistryError::InvariantViolated(_))
        ));
    }

    #[test]
    fn active_task_must_name_holder() {
        let mut a = forklift("a");
        a.current_task = Some("t".into());
        let mut t = task("t");
        t.status = TaskStatus::Assigned;
        t.assigned_forklift = Some("b".into());
        let r = Registry::with(vec![a], vec![t]).unwrap();
        assert!(r.check_invariants().is_err());
    }

    #[test]
    fn open_task_count_skips_completed() {
        let mut done = task("done");
        done.status = TaskStatus::Completed;
        let r = Registry::with(vec![], vec![task("t"), done]).unwrap();
        assert_eq!(r.open_task_count(), 1);
        assert_eq!(r.check_invariants(), Ok(()));
    }
}
