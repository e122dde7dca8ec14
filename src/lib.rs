//! wareflow - warehouse forklift fleet simulation
//!
//! A tick-driven scheduler that assigns material-movement tasks to forklifts,
//! routes them over a warehouse grid with contention-aware A* search, and
//! raises operational alerts (collisions, stuck forklifts, low fuel, overload).
//! A tabular Q-learning value estimator is carried alongside as an injectable
//! strategy.

pub mod algorithms;
pub mod alerts;
pub mod clock;
pub mod config;
pub mod fleet;
pub mod grid;
pub mod logging;
pub mod metrics;
pub mod simulation;

pub use alerts::{AlertKind, AlertLog, DedupPolicy, EmergencyAlert, Severity};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{ConfigError, SimulationConfig};
pub use fleet::{Forklift, ForkliftStatus, Material, Registry, Task, TaskStatus};
pub use grid::{Cell, CellKind, Grid, GridError, Position};
pub use metrics::FleetMetrics;
pub use simulation::{Simulation, SimulationError, SimulationRunner, WarehouseSnapshot};

/// Identifier type used for forklifts, tasks, materials and alerts.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
