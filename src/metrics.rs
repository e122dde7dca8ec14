//! Fleet-wide running aggregates.

use crate::fleet::Forklift;

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetMetrics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Mean completion time of finished tasks (ms).
    pub average_time_ms: f64,
    /// Cells travelled per fuel point consumed.
    pub fuel_efficiency: f64,
    /// Ticks on which at least two forklifts shared a cell.
    pub collision_count: u64,
    pub blocked_paths: u64,
    /// Kilograms delivered to dropoff cells.
    pub total_weight_moved: f64,
    /// `Σ load / Σ capacity × 100`.
    pub average_load_utilization: f64,
}

impl FleetMetrics {
    /// Folds one completion time into the running mean.
    pub fn record_completion(&mut self, elapsed_ms: u64) {
        let n = self.completed_tasks as f64;
        self.average_time_ms = (self.average_time_ms * n + elapsed_ms as f64) / (n + 1.0);
        self.completed_tasks += 1;
    }

    /// Recomputes the fleet-derived figures.
    pub fn refresh_fleet<'a>(&mut self, forklifts: impl IntoIterator<Item = &'a Forklift>) {
        let mut load = 0.0;
        let mut capacity = 0.0;
        let mut distance = 0u64;
        let mut fuel_used = 0.0;
        for f in forklifts {
            load += f.current_load;
            capacity += f.capacity;
            distance += u64::from(f.total_distance);
            fuel_used += f.fuel_consumed();
        }
        self.average_load_utilization = if capacity > 0.0 {
            load / capacity * 100.0
        } else {
            0.0
        };
        self.fuel_efficiency = if fuel_used > 0.0 {
            distance as f64 / fuel_used
        } else {
            0.0
        };
    }
}
