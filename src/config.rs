//! Simulation configuration.

use std::time::Duration;

use thiserror::Error;

use crate::alerts::DedupPolicy;
use crate::grid::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Shortest allowed tick period.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(200);
/// Smallest grid the layout generator handles sensibly.
pub const MIN_GRID_SIDE: usize = 16;
/// Size of the default fleet roster.
pub const MAX_FORKLIFTS: usize = 5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("forklift count must be within [1, {max}], got {value}")]
    ForkliftCount { value: usize, max: usize },

    #[error("max tasks must be at least 1")]
    NoTaskCapacity,

    #[error("grid must be at least {min}x{min}, got {width}x{height}")]
    GridTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },

    #[error("Invalid configuration JSON: {0}")]
    Parse(String),
}

/// Knobs for the scheduler, the value estimator and the warehouse layout.
///
/// With the `serde` feature the struct (de)serializes with camelCase keys and
/// every missing key falls back to its default.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct SimulationConfig {
    // --- Value estimator ---
    /// Step size α of the TD update.
    pub learning_rate: f64,
    /// Initial ε for ε-greedy action selection.
    pub exploration_rate: f64,
    /// Discount γ.
    pub discount_factor: f64,
    /// Feed executed moves to the estimator.
    pub learn_from_moves: bool,

    // --- Scheduler ---
    /// Tick-rate multiplier; the period is `1000 ms / speed`, floored at 200 ms.
    pub speed: f64,
    /// Cap on non-completed tasks for randomly generated work.
    pub max_tasks: usize,
    /// Size of the default fleet.
    pub forklift_count: usize,
    /// Reroute or wait instead of stepping into an occupied cell.
    pub collision_avoidance: bool,
    /// Stuck detection, resource alerts and collision alerts.
    pub emergency_response: bool,
    /// Reported in snapshots; capacity checks always apply.
    pub weight_management: bool,
    /// Reported in snapshots.
    pub real_time_updates: bool,
    /// Alert kinds suppressed while an unresolved alert of the same kind
    /// exists for the same forklift.
    pub alert_dedup: DedupPolicy,

    // --- Layout ---
    pub grid_width: usize,
    pub grid_height: usize,
    /// Random tasks generated on reset.
    pub initial_tasks: usize,
}

impl SimulationConfig {
    /// Wall-clock time between automatic ticks.
    pub fn tick_period(&self) -> Duration {
        if self.speed <= 0.0 || !self.speed.is_finite() {
            return Duration::from_millis(1000);
        }
        Duration::from_secs_f64(1.0 / self.speed).max(MIN_TICK_PERIOD)
    }

    /// Checks every option against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("learning_rate", self.learning_rate, 0.01, 1.0)?;
        check_range("exploration_rate", self.exploration_rate, 0.01, 1.0)?;
        check_range("discount_factor", self.discount_factor, 0.1, 0.99)?;
        check_range("speed", self.speed, 0.1, 3.0)?;
        if self.forklift_count == 0 || self.forklift_count > MAX_FORKLIFTS {
            return Err(ConfigError::ForkliftCount {
                value: self.forklift_count,
                max: MAX_FORKLIFTS,
            });
        }
        if self.max_tasks == 0 {
            return Err(ConfigError::NoTaskCapacity);
        }
        if self.grid_width < MIN_GRID_SIDE || self.grid_height < MIN_GRID_SIDE {
            return Err(ConfigError::GridTooSmall {
                width: self.grid_width,
                height: self.grid_height,
                min: MIN_GRID_SIDE,
            });
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration.
    #[cfg(feature = "serde")]
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            exploration_rate: 0.3,
            discount_factor: 0.9,
            learn_from_moves: false,
            speed: 1.0,
            max_tasks: 15,
            forklift_count: 5,
            collision_avoidance: true,
            emergency_response: true,
            weight_management: true,
            real_time_updates: true,
            alert_dedup: DedupPolicy::default(),
            grid_width: DEFAULT_WIDTH,
            grid_height: DEFAULT_HEIGHT,
            initial_tasks: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.tick_period(), Duration::from_millis(1000));
    }

    #[test]
    fn tick_period_is_floored() {
        let cfg = SimulationConfig {
            speed: 3.0,
            ..SimulationConfig::default()
        };
        assert_eq!(cfg.tick_period(), Duration::from_secs_f64(1.0 / 3.0));
        let fast = SimulationConfig {
            speed: 10.0,
            ..SimulationConfig::default()
        };
        assert_eq!(fast.tick_period(), MIN_TICK_PERIOD);
        let slow = SimulationConfig {
            speed: 0.5,
            ..SimulationConfig::default()
        };
        assert_eq!(slow.tick_period(), Duration::from_millis(2000));
    }

    #[test]
    fn rejects_out_of_range() {
        let cfg = SimulationConfig {
            discount_factor: 1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                field: "discount_factor",
                ..
            })
        ));

        let cfg = SimulationConfig {
            forklift_count: 6,
            ..SimulationConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ForkliftCount { value: 6, max: 5 })
        );

        let cfg = SimulationConfig {
            grid_width: 10,
            ..SimulationConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::GridTooSmall { .. })));

        let cfg = SimulationConfig {
            max_tasks: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoTaskCapacity));
    }

    #[test]
    fn out_of_range_display() {
        let e = ConfigError::OutOfRange {
            field: "speed",
            min: 0.1,
            max: 3.0,
            value: 5.0,
        };
        assert_eq!(e.to_string(), "speed must be within [0.1, 3], got 5");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_json_fills_defaults() {
        let cfg = SimulationConfig::from_json(r#"{"learningRate": 0.2, "forkliftCount": 3}"#)
            .unwrap();
        assert_eq!(cfg.learning_rate, 0.2);
        assert_eq!(cfg.forklift_count, 3);
        assert_eq!(cfg.max_tasks, 15);
        assert!(cfg.collision_avoidance);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_json_validates() {
        assert!(matches!(
            SimulationConfig::from_json(r#"{"speed": 9.0}"#),
            Err(ConfigError::OutOfRange { field: "speed", .. })
        ));
        assert!(matches!(
            SimulationConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
