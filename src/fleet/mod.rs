//! Forklifts, tasks and the registry that owns them.

mod forklift;
mod generator;
mod registry;
mod task;

pub use forklift::{Forklift, ForkliftStatus, MaintenanceStatus, FULL_LEVEL};
pub use generator::{default_fleet, TaskGenerator};
pub use registry::{Registry, RegistryError};
pub use task::{Dimensions, Location, Material, MaterialPriority, Task, TaskCategory, TaskStatus};
