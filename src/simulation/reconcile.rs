//! Task status follows forklift state.
//!
//! Forklifts only hold a task id; after the per-forklift pass this module
//! brings every task record in line with whoever holds it.

use tracing::info;

use super::history::TaskHistoryRecord;
use super::tick::TickReport;
use super::Simulation;
use crate::clock::Timestamp;
use crate::fleet::{ForkliftStatus, Registry, TaskStatus};

impl Simulation {
    /// * holder idle: the task is completed and the reference cleared;
    /// * holder carrying: the task is carrying;
    /// * any other holder: a pending task becomes assigned;
    /// * no holder: an active task returns to pending.
    pub(crate) fn reconcile(&mut self, now: Timestamp, report: &mut TickReport) {
        let Simulation {
            registry,
            metrics,
            history,
            ..
        } = self;
        let Registry { forklifts, tasks } = registry;

        for task in tasks.iter_mut() {
            let holder = forklifts
                .iter_mut()
                .find(|f| f.current_task.as_deref() == Some(task.id.as_str()));

            let Some(holder) = holder else {
                if task.status.is_active() {
                    info!(task = %task.id, "task has no forklift, back to pending");
                    task.release();
                }
                continue;
            };

            if task.status == TaskStatus::Completed {
                holder.current_task = None;
                continue;
            }
            task.assigned_forklift = Some(holder.id.clone());

            match holder.status {
                ForkliftStatus::Idle => {
                    let elapsed = now.saturating_sub(task.assigned_at.unwrap_or(task.created_at));
                    task.status = TaskStatus::Completed;
                    task.completed_at = Some(now);
                    task.actual_time_ms = Some(elapsed);
                    metrics.record_completion(elapsed);
                    history.record(TaskHistoryRecord::completed(task, &holder.id, now, elapsed));
                    holder.current_task = None;
                    info!(task = %task.id, forklift = %holder.id, elapsed_ms = elapsed, "task completed");
                    report.completed.push(task.id.clone());
                }
                ForkliftStatus::Carrying => {
                    task.assigned_at.get_or_insert(now);
                    if task.status != TaskStatus::Carrying {
                        task.status = TaskStatus::Carrying;
                        task.started_at = Some(now);
                    }
                }
                _ => {
                    if task.status == TaskStatus::Pending {
                        task.status = TaskStatus::Assigned;
                        task.assigned_at = Some(now);
                    }
                }
            }
        }
    }
}
