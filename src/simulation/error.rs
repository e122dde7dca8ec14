use thiserror::Error;

use crate::config::ConfigError;
use crate::fleet::RegistryError;
use crate::grid::Position;
use crate::Id;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Task {0} is not pending")]
    TaskNotPending(Id),

    #[error("Forklift {0} already has work")]
    ForkliftBusy(Id),

    #[error("Forklift {0} is not logged in")]
    ForkliftOffline(Id),

    #[error("Forklift {forklift} cannot carry {weight}kg (load {load}kg of {capacity}kg)")]
    CapacityExceeded {
        forklift: Id,
        weight: f64,
        load: f64,
        capacity: f64,
    },

    #[error("No path from {from} to {to} for forklift {forklift}")]
    NoPath {
        forklift: Id,
        from: Position,
        to: Position,
    },

    #[error("Forklift {0} has no step to take")]
    NothingToAdvance(Id),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_errors_are_transparent() {
        let e: SimulationError = RegistryError::TaskNotFound("t-9".into()).into();
        assert_eq!(e.to_string(), "Unknown task: t-9");
    }

    #[test]
    fn capacity_display() {
        let e = SimulationError::CapacityExceeded {
            forklift: "forklift-3".into(),
            weight: 450.0,
            load: 500.0,
            capacity: 800.0,
        };
        assert_eq!(
            e.to_string(),
            "Forklift forklift-3 cannot carry 450kg (load 500kg of 800kg)"
        );
    }

    #[test]
    fn no_path_display() {
        let e = SimulationError::NoPath {
            forklift: "f".into(),
            from: Position::new(1, 2),
            to: Position::new(3, 4),
        };
        assert_eq!(e.to_string(), "No path from (1, 2) to (3, 4) for forklift f");
    }

    #[test]
    fn config_errors_convert() {
        let e: SimulationError = ConfigError::NoTaskCapacity.into();
        assert!(matches!(e, SimulationError::InvalidConfig(_)));
    }
}
