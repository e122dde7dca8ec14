use crate::alerts::EmergencyAlert;
use crate::config::SimulationConfig;
use crate::fleet::{Forklift, Task};
use crate::grid::Grid;
use crate::metrics::FleetMetrics;

/// Read-only copy of the simulation state for display or export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WarehouseSnapshot {
    pub tick: u64,
    pub running: bool,
    pub forklifts: Vec<Forklift>,
    pub tasks: Vec<Task>,
    pub grid: Grid,
    pub alerts: Vec<EmergencyAlert>,
    pub metrics: FleetMetrics,
    pub exploration_rate: f64,
    /// States the value estimator has learned values for.
    pub q_states: usize,
    pub config: SimulationConfig,
}

impl WarehouseSnapshot {
    pub fn unresolved_alerts(&self) -> impl Iterator<Item = &EmergencyAlert> {
        self.alerts.iter().filter(|a| !a.resolved)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
