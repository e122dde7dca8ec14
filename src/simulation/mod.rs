//! The warehouse simulation: state, commands and the tick scheduler.
//!
//! [`Simulation`] owns the grid, the registry of forklifts and tasks, the
//! alert log, metrics and the value estimator. Every mutation goes through
//! `&mut Simulation`, either directly or under the lock held by
//! [`SimulationRunner`].

mod commands;
mod error;
mod history;
mod movement;
mod reconcile;
mod runner;
mod snapshot;
mod tick;


pub use error::SimulationError;
pub use history::{HistorySink, MemoryHistory, TaskHistoryRecord};
pub use movement::{Move, MoveKind, StepOutcome, BLOCKED_BACKDATE_MS};
pub use runner::SimulationRunner;
pub use snapshot::WarehouseSnapshot;
pub use tick::{TickReport, EXPLORATION_DECAY_INTERVAL, STUCK_AFTER_MS};

use std::sync::Arc;

use crate::algorithms::rl::{QLearning, ValueEstimator};
use crate::alerts::AlertLog;
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::config::SimulationConfig;
use crate::fleet::{default_fleet, Forklift, Registry, Task, TaskGenerator};
use crate::grid::{Grid, GridStore, MemoryGridStore};
use crate::metrics::FleetMetrics;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 42;

pub struct Simulation {
    config: SimulationConfig,
    grid: Grid,
    registry: Registry,
    alerts: AlertLog,
    metrics: FleetMetrics,
    estimator: Box<dyn ValueEstimator>,
    clock: Arc<dyn Clock>,
    grid_store: Box<dyn GridStore>,
    history: Box<dyn HistorySink>,
    generator: TaskGenerator,
    running: bool,
    tick_count: u64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick_count", &self.tick_count)
            .field("running", &self.running)
            .field("forklifts", &self.registry.forklifts.len())
            .field("tasks", &self.registry.tasks.len())
            .field("estimator", &self.estimator.name())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// A simulation with the default collaborators, a generated layout, the
    /// default fleet and a batch of random tasks.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::default()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn forklifts(&self) -> &[Forklift] {
        self.registry.forklifts()
    }

    pub fn tasks(&self) -> &[Task] {
        self.registry.tasks()
    }

    pub fn forklift(&self, id: &str) -> Option<&Forklift> {
        self.registry.forklift(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.registry.task(id)
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn metrics(&self) -> &FleetMetrics {
        &self.metrics
    }

    pub fn estimator(&self) -> &dyn ValueEstimator {
        &*self.estimator
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now_ms()
    }
}

/// Builder for [`Simulation`]. Anything not set falls back to a default.
#[derive(Default)]
pub struct SimulationBuilder {
    config: Option<SimulationConfig>,
    clock: Option<Arc<dyn Clock>>,
    estimator: Option<Box<dyn ValueEstimator>>,
    grid_store: Option<Box<dyn GridStore>>,
    history: Option<Box<dyn HistorySink>>,
    grid: Option<Grid>,
    forklifts: Option<Vec<Forklift>>,
    tasks: Option<Vec<Task>>,
    seed: Option<u64>,
}

impl SimulationBuilder {
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn estimator(mut self, estimator: impl ValueEstimator + 'static) -> Self {
        self.estimator = Some(Box::new(estimator));
        self
    }

    pub fn grid_store(mut self, store: impl GridStore + 'static) -> Self {
        self.grid_store = Some(Box::new(store));
        self
    }

    pub fn history(mut self, sink: impl HistorySink + 'static) -> Self {
        self.history = Some(Box::new(sink));
        self
    }

    /// Uses this layout instead of the cached or generated one.
    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Uses these forklifts instead of the default fleet.
    pub fn forklifts(mut self, forklifts: Vec<Forklift>) -> Self {
        self.forklifts = Some(forklifts);
        self
    }

    /// Uses these tasks instead of random ones.
    pub fn tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// Seeds task generation and exploration.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Simulation, SimulationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let seed = self.seed.unwrap_or(DEFAULT_SEED);
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let now = clock.now_ms();

        let mut grid_store = self
            .grid_store
            .unwrap_or_else(|| Box::new(MemoryGridStore::new()));
        let grid = match self.grid {
            Some(grid) => grid,
            None => grid_store
                .load()
                .unwrap_or_else(|| Grid::generate(config.grid_width, config.grid_height)),
        };
        grid_store.save(&grid);

        let mut generator = TaskGenerator::new(seed);
        let forklifts = self
            .forklifts
            .unwrap_or_else(|| default_fleet(config.forklift_count, now));
        let tasks = self
            .tasks
            .unwrap_or_else(|| generator.random_tasks(config.initial_tasks, &grid, now));
        let registry = Registry::with(forklifts, tasks)?;

        let estimator = self
            .estimator
            .unwrap_or_else(|| Box::new(QLearning::from_config(&config, seed)));
        let history = self
            .history
            .unwrap_or_else(|| Box::new(MemoryHistory::new()));

        let metrics = FleetMetrics {
            total_tasks: registry.tasks().len(),
            ..FleetMetrics::default()
        };
        tracing::info!(
            forklifts = registry.forklifts().len(),
            tasks = registry.tasks().len(),
            width = grid.width(),
            height = grid.height(),
            estimator = estimator.name(),
            "simulation ready"
        );

        Ok(Simulation {
            alerts: AlertLog::new(config.alert_dedup.clone()),
            config,
            grid,
            registry,
            metrics,
            estimator,
            clock,
            grid_store,
            history,
            generator,
            running: false,
            tick_count: 0,
        })
    }
}
