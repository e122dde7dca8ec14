//! Operator and dashboard commands.

use tracing::{debug, info, warn};

use super::movement::{self, MoveContext, StepOutcome};
use super::tick::TickReport;
use super::{Simulation, SimulationError, WarehouseSnapshot};
use crate::algorithms::pathfinding::Footprint;
use crate::alerts::{AlertKind, EmergencyAlert, Severity, SYSTEM_SOURCE};
use crate::config::SimulationConfig;
use crate::fleet::{default_fleet, Forklift, ForkliftStatus, Registry, RegistryError, Task, TaskStatus};
use crate::grid::{Grid, Position};
use crate::metrics::FleetMetrics;
use crate::Id;

/// Takes the forklift's task, if any, and hands it back to the pool.
/// Material already picked up is set down.
fn release_held_task(forklift: &mut Forklift, tasks: &mut [Task]) -> Option<Id> {
    let task_id = forklift.current_task.take()?;
    if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
        if task.started_at.is_some() || forklift.status == ForkliftStatus::Carrying {
            forklift.unload(task.material.weight);
        }
        if task.status != TaskStatus::Completed {
            task.release();
        }
    }
    Some(task_id)
}

impl Simulation {
    fn footprints(&self) -> Vec<Footprint> {
        self.registry
            .forklifts
            .iter()
            .map(Forklift::footprint)
            .collect()
    }

    fn sync_occupancy(&mut self) {
        self.grid
            .sync_occupancy(self.registry.forklifts.iter().map(|f| (&f.id, f.position)));
    }

    /// Starts or pauses automatic movement. Ticks still assign work while
    /// paused.
    pub fn set_running(&mut self, running: bool) {
        if self.running != running {
            info!(running, "simulation {}", if running { "started" } else { "paused" });
        }
        self.running = running;
    }

    /// Rebuilds fleet, tasks, metrics and alerts.
    ///
    /// With `regenerate_grid` the layout cache is cleared and a fresh layout
    /// generated; otherwise the cached layout is reused when there is one.
    pub fn reset(&mut self, regenerate_grid: bool) {
        let now = self.clock.now_ms();
        if regenerate_grid {
            self.grid_store.clear();
        }
        self.grid = self
            .grid_store
            .load()
            .unwrap_or_else(|| Grid::generate(self.config.grid_width, self.config.grid_height));
        self.grid_store.save(&self.grid);

        let tasks = self
            .generator
            .random_tasks(self.config.initial_tasks, &self.grid, now);
        self.registry = Registry {
            forklifts: default_fleet(self.config.forklift_count, now),
            tasks,
        };
        self.metrics = FleetMetrics {
            total_tasks: self.registry.tasks.len(),
            ..FleetMetrics::default()
        };
        self.alerts.clear();
        self.running = false;
        self.tick_count = 0;
        self.sync_occupancy();
        info!(
            regenerate_grid,
            forklifts = self.registry.forklifts.len(),
            tasks = self.registry.tasks.len(),
            "simulation reset"
        );
    }

    /// Applies a new configuration.
    ///
    /// The estimator picks up the new rates. A changed forklift count while
    /// paused rebuilds the default fleet on the cached layout and returns all
    /// held work to the pool.
    pub fn set_config(&mut self, config: SimulationConfig) -> Result<(), SimulationError> {
        config.validate()?;
        let old = std::mem::replace(&mut self.config, config);
        self.estimator.apply_config(&self.config);
        self.alerts.set_policy(self.config.alert_dedup.clone());

        if old.forklift_count != self.config.forklift_count && !self.running {
            let now = self.clock.now_ms();
            if let Some(grid) = self.grid_store.load() {
                self.grid = grid;
            }
            for task in self.registry.tasks.iter_mut() {
                if task.status.is_active() {
                    task.release();
                }
            }
            self.registry.forklifts = default_fleet(self.config.forklift_count, now);
            self.sync_occupancy();
            info!(forklifts = self.config.forklift_count, "fleet rebuilt");
        }
        Ok(())
    }

    /// Adds one random task. Returns `None` when the open-task cap is
    /// reached or no task could be placed.
    pub fn add_random_task(&mut self) -> Option<Id> {
        if self.registry.open_task_count() >= self.config.max_tasks {
            debug!(max_tasks = self.config.max_tasks, "task cap reached");
            return None;
        }
        let now = self.clock.now_ms();
        let task = self.generator.random_task(&self.grid, now)?;
        let id = task.id.clone();
        if let Err(err) = self.registry.add_task(task) {
            warn!(%err, "generated task rejected");
            return None;
        }
        self.metrics.total_tasks += 1;
        debug!(task = %id, "random task added");
        Some(id)
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), SimulationError> {
        let id = task.id.clone();
        self.registry.add_task(task)?;
        self.metrics.total_tasks += 1;
        debug!(task = %id, "task added");
        Ok(())
    }

    pub fn add_forklift(&mut self, forklift: Forklift) -> Result<(), SimulationError> {
        let id = forklift.id.clone();
        self.registry.add_forklift(forklift)?;
        self.sync_occupancy();
        info!(forklift = %id, "forklift added");
        Ok(())
    }

    /// Applies `update` to one forklift.
    ///
    /// An update that leaves the registry inconsistent (a duplicate id, a
    /// reference to an unknown task, levels out of range) is rolled back and
    /// the violation returned.
    pub fn update_forklift<F>(&mut self, id: &str, update: F) -> Result<(), SimulationError>
    where
        F: FnOnce(&mut Forklift),
    {
        let index = self
            .registry
            .forklifts
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| RegistryError::ForkliftNotFound(id.to_string()))?;
        let before = self.registry.forklifts[index].clone();
        update(&mut self.registry.forklifts[index]);
        if let Err(err) = self.registry.check_invariants() {
            self.registry.forklifts[index] = before;
            warn!(forklift = %id, %err, "forklift update rejected");
            return Err(err.into());
        }
        self.sync_occupancy();
        Ok(())
    }

    /// Removes a forklift and returns its task to the pool.
    pub fn remove_forklift(&mut self, id: &str) -> Result<Forklift, SimulationError> {
        let mut forklift = self.registry.remove_forklift(id)?;
        release_held_task(&mut forklift, &mut self.registry.tasks);
        self.sync_occupancy();
        info!(forklift = %id, "forklift removed");
        Ok(forklift)
    }

    pub fn login(&mut self, id: &str) -> Result<(), SimulationError> {
        let now = self.clock.now_ms();
        let forklift = self.registry.require_forklift_mut(id)?;
        forklift.is_logged_in = true;
        forklift.last_login_time = Some(now);
        if forklift.status == ForkliftStatus::Offline {
            forklift.go_idle();
        }
        info!(forklift = %id, operator = %forklift.operator_name, "logged in");
        Ok(())
    }

    /// Takes the forklift offline, releasing its task and setting down any
    /// load.
    pub fn logout(&mut self, id: &str) -> Result<(), SimulationError> {
        let Registry { forklifts, tasks } = &mut self.registry;
        let forklift = forklifts
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| RegistryError::ForkliftNotFound(id.to_string()))?;
        let released = release_held_task(forklift, tasks);
        forklift.current_load = 0.0;
        forklift.is_logged_in = false;
        forklift.go_idle();
        forklift.status = ForkliftStatus::Offline;
        forklift.clear_blockage();
        info!(forklift = %id, task = ?released, "logged out");
        Ok(())
    }

    /// Hands a pending task to an idle forklift.
    pub fn accept_task(&mut self, task_id: &str, forklift_id: &str) -> Result<(), SimulationError> {
        let now = self.clock.now_ms();
        let footprints = self.footprints();
        let Registry { forklifts, tasks } = &mut self.registry;

        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| RegistryError::TaskNotFound(task_id.to_string()))?;
        if !task.is_open() {
            return Err(SimulationError::TaskNotPending(task_id.to_string()));
        }
        let forklift = forklifts
            .iter_mut()
            .find(|f| f.id == forklift_id)
            .ok_or_else(|| RegistryError::ForkliftNotFound(forklift_id.to_string()))?;
        if !forklift.is_logged_in {
            return Err(SimulationError::ForkliftOffline(forklift_id.to_string()));
        }
        if forklift.current_task.is_some() || forklift.status != ForkliftStatus::Idle {
            return Err(SimulationError::ForkliftBusy(forklift_id.to_string()));
        }
        if !forklift.can_carry(&task.material) {
            return Err(SimulationError::CapacityExceeded {
                forklift: forklift_id.to_string(),
                weight: task.material.weight,
                load: forklift.current_load,
                capacity: forklift.capacity,
            });
        }
        if !movement::begin_task(forklift, task, &self.grid, &footprints, now) {
            return Err(SimulationError::NoPath {
                forklift: forklift_id.to_string(),
                from: forklift.position,
                to: task.pickup.position,
            });
        }

        task.status = TaskStatus::Assigned;
        task.assigned_forklift = Some(forklift_id.to_string());
        task.assigned_at = Some(now);
        if forklift.status == ForkliftStatus::Carrying {
            task.status = TaskStatus::Carrying;
            task.started_at = Some(now);
        }
        info!(task = %task_id, forklift = %forklift_id, "task accepted");
        Ok(())
    }

    /// Moves a forklift one cell along its route, whether or not the
    /// simulation is running. Stepping into an occupied cell is always
    /// refused or rerouted.
    pub fn complete_current_step(&mut self, forklift_id: &str) -> Result<StepOutcome, SimulationError> {
        let now = self.clock.now_ms();
        let footprints = self.footprints();
        let Simulation {
            grid,
            registry,
            metrics,
            estimator,
            config,
            ..
        } = self;
        let Registry { forklifts, tasks } = registry;
        let forklift = forklifts
            .iter_mut()
            .find(|f| f.id == forklift_id)
            .ok_or_else(|| RegistryError::ForkliftNotFound(forklift_id.to_string()))?;
        if !forklift.status.is_travelling() || forklift.path.len() < 2 {
            return Err(SimulationError::NothingToAdvance(forklift_id.to_string()));
        }
        let task = forklift
            .current_task
            .as_ref()
            .and_then(|id| tasks.iter().find(|t| &t.id == id));
        let ctx = MoveContext {
            grid,
            footprints: &footprints,
            collision_avoidance: true,
            now,
        };
        let outcome = movement::advance(forklift, task, &ctx, metrics);
        if let Some(mv) = outcome.movement() {
            if config.learn_from_moves {
                movement::learn_from_move(&mut **estimator, grid, mv);
            }
        }

        self.reconcile(now, &mut TickReport::default());
        self.sync_occupancy();
        Ok(outcome)
    }

    /// Halts a forklift where it stands.
    pub fn emergency_stop(&mut self, id: &str) -> Result<(), SimulationError> {
        let forklift = self.registry.require_forklift_mut(id)?;
        forklift.status = ForkliftStatus::Emergency;
        forklift.path.clear();
        forklift.is_blocked = true;
        forklift.blockage_reason = Some("Emergency stop".to_string());
        warn!(forklift = %id, at = %forklift.position, "emergency stop");
        Ok(())
    }

    /// Returns a stuck or stopped forklift to idle and its task to the pool.
    pub fn recover(&mut self, id: &str) -> Result<(), SimulationError> {
        let now = self.clock.now_ms();
        let Registry { forklifts, tasks } = &mut self.registry;
        let forklift = forklifts
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| RegistryError::ForkliftNotFound(id.to_string()))?;
        if !matches!(
            forklift.status,
            ForkliftStatus::Stuck | ForkliftStatus::Emergency
        ) {
            return Ok(());
        }
        let released = release_held_task(forklift, tasks);
        forklift.go_idle();
        forklift.clear_blockage();
        forklift.last_move_time = now;
        info!(forklift = %id, task = ?released, "recovered");
        Ok(())
    }

    /// Turns a cell into an obstacle and raises a path-blocked alert.
    pub fn add_obstacle(&mut self, pos: Position) -> bool {
        if !self.grid.add_obstacle(pos) {
            return false;
        }
        self.grid_store.save(&self.grid);
        self.metrics.blocked_paths += 1;
        let now = self.clock.now_ms();
        self.alerts.raise(EmergencyAlert::new(
            AlertKind::PathBlocked,
            Severity::Medium,
            SYSTEM_SOURCE,
            pos,
            format!("New obstacle added at {pos}"),
            now,
        ));
        true
    }

    pub fn add_shelf(&mut self, pos: Position) -> bool {
        if !self.grid.add_shelf(pos, format!("Shelf-{}-{}", pos.x, pos.y)) {
            return false;
        }
        self.grid_store.save(&self.grid);
        debug!(at = %pos, "shelf added");
        true
    }

    pub fn remove_shelf(&mut self, pos: Position) -> bool {
        if !self.grid.remove_shelf(pos) {
            return false;
        }
        self.grid_store.save(&self.grid);
        debug!(at = %pos, "shelf removed");
        true
    }

    pub fn snapshot(&self) -> WarehouseSnapshot {
        WarehouseSnapshot {
            tick: self.tick_count,
            running: self.running,
            forklifts: self.registry.forklifts.clone(),
            tasks: self.registry.tasks.clone(),
            grid: self.grid.clone(),
            alerts: self.alerts.all().to_vec(),
            metrics: self.metrics.clone(),
            exploration_rate: self.estimator.exploration_rate(),
            q_states: self.estimator.state_count(),
            config: self.config.clone(),
        }
    }
}
