//! The per-tick scheduler.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::movement::{self, MoveContext};
use super::Simulation;
use crate::algorithms::pathfinding::Footprint;
use crate::algorithms::rl::ValueEstimator;
use crate::alerts::{AlertKind, AlertLog, EmergencyAlert, Severity};
use crate::clock::Timestamp;
use crate::config::SimulationConfig;
use crate::fleet::{Forklift, ForkliftStatus, MaintenanceStatus, Task};
use crate::grid::Grid;
use crate::metrics::FleetMetrics;
use crate::Id;

/// A travelling forklift that has not moved for longer than this is stuck.
pub const STUCK_AFTER_MS: u64 = 15_000;
/// Fuel percentage below which a low-fuel alert is raised.
pub const LOW_FUEL: f64 = 15.0;
/// Battery percentage below which maintenance becomes critical.
pub const CRITICAL_BATTERY: f64 = 10.0;
/// Battery percentage below which maintenance becomes a warning.
pub const WARNING_BATTERY: f64 = 25.0;
/// Ticks between exploration decays.
pub const EXPLORATION_DECAY_INTERVAL: u64 = 10;

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// `(forklift, task)` pairs assigned this tick.
    pub assigned: Vec<(Id, Id)>,
    /// Forklifts that moved one cell.
    pub moved: usize,
    /// Tasks marked completed by reconciliation.
    pub completed: Vec<Id>,
    /// Forklifts that dropped their task without delivering it.
    pub abandoned: Vec<Id>,
    /// At least two forklifts ended the tick on the same cell.
    pub collision: bool,
    pub alerts_raised: usize,
    pub alerts_resolved: usize,
}

/// Borrowed state for the per-forklift pass.
struct ForkliftPass<'a> {
    config: &'a SimulationConfig,
    grid: &'a Grid,
    tasks: &'a [Task],
    footprints: &'a [Footprint],
    claimed: HashSet<Id>,
    alerts: &'a mut AlertLog,
    metrics: &'a mut FleetMetrics,
    estimator: &'a mut dyn ValueEstimator,
    running: bool,
    now: Timestamp,
    report: &'a mut TickReport,
}

impl<'a> ForkliftPass<'a> {
    fn raise(&mut self, alert: EmergencyAlert) {
        if self.alerts.raise(alert) {
            self.report.alerts_raised += 1;
        }
    }

    fn task(&self, id: Option<&Id>) -> Option<&'a Task> {
        let id = id?;
        let tasks: &'a [Task] = self.tasks;
        tasks.iter().find(|t| &t.id == id)
    }

    fn update(&mut self, forklift: &mut Forklift) {
        if !forklift.is_logged_in {
            forklift.status = ForkliftStatus::Offline;
            return;
        }

        if self.config.emergency_response && self.is_stuck(forklift) {
            self.raise(EmergencyAlert::new(
                AlertKind::Stuck,
                Severity::High,
                forklift.id.as_str(),
                forklift.position,
                format!("{} has been stuck for too long", forklift.id),
                self.now,
            ));
            forklift.status = ForkliftStatus::Stuck;
            forklift.is_blocked = true;
            forklift.blockage_reason = Some("Path blocked or no valid moves".to_string());
            self.metrics.blocked_paths += 1;
            return;
        }

        if self.config.emergency_response {
            self.check_resources(forklift);
        }

        if forklift.status == ForkliftStatus::Idle && forklift.current_task.is_none() {
            self.assign(forklift);
            return;
        }

        if self.running && forklift.status.is_travelling() && forklift.path.len() >= 2 {
            let task = self.task(forklift.current_task.as_ref());
            let ctx = MoveContext {
                grid: self.grid,
                footprints: self.footprints,
                collision_avoidance: self.config.collision_avoidance,
                now: self.now,
            };
            let outcome = movement::advance(forklift, task, &ctx, self.metrics);
            if let Some(mv) = outcome.movement() {
                self.report.moved += 1;
                if self.config.learn_from_moves {
                    movement::learn_from_move(self.estimator, self.grid, mv);
                }
            }
            return;
        }

        if forklift.path.len() <= 1
            && !matches!(
                forklift.status,
                ForkliftStatus::Idle | ForkliftStatus::Emergency
            )
        {
            self.finish_route(forklift);
        }
    }

    fn is_stuck(&self, forklift: &Forklift) -> bool {
        forklift.status.is_travelling()
            && !forklift.path.is_empty()
            && self.now.saturating_sub(forklift.last_move_time) > STUCK_AFTER_MS
    }

    fn check_resources(&mut self, forklift: &mut Forklift) {
        if forklift.fuel_level < LOW_FUEL {
            self.raise(EmergencyAlert::new(
                AlertKind::LowFuel,
                Severity::High,
                forklift.id.as_str(),
                forklift.position,
                format!("{} has low fuel: {:.1}%", forklift.id, forklift.fuel_level),
                self.now,
            ));
        }
        if forklift.is_overloaded() {
            self.raise(EmergencyAlert::new(
                AlertKind::Overload,
                Severity::Critical,
                forklift.id.as_str(),
                forklift.position,
                format!(
                    "{} is overloaded: {}kg > {}kg",
                    forklift.id, forklift.current_load, forklift.capacity
                ),
                self.now,
            ));
        }
        if forklift.battery_level < CRITICAL_BATTERY {
            forklift.maintenance_status = MaintenanceStatus::Critical;
            self.raise(EmergencyAlert::new(
                AlertKind::MaintenanceRequired,
                Severity::Medium,
                forklift.id.as_str(),
                forklift.position,
                format!(
                    "{} needs maintenance: battery at {:.1}%",
                    forklift.id, forklift.battery_level
                ),
                self.now,
            ));
        } else if forklift.battery_level < WARNING_BATTERY {
            forklift.maintenance_status = MaintenanceStatus::Warning;
        }
    }

    /// Highest priority first, then nearest pickup. Candidates are tried in
    /// order until one can be routed.
    fn assign(&mut self, forklift: &mut Forklift) {
        let origin = forklift.position;
        let tasks: &'a [Task] = self.tasks;
        let mut candidates: Vec<&'a Task> = tasks
            .iter()
            .filter(|t| {
                t.is_open() && !self.claimed.contains(&t.id) && forklift.can_carry(&t.material)
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.priority.cmp(&a.priority).then_with(|| {
                origin
                    .manhattan(&a.pickup.position)
                    .cmp(&origin.manhattan(&b.pickup.position))
            })
        });

        for task in candidates {
            if movement::begin_task(forklift, task, self.grid, self.footprints, self.now) {
                self.claimed.insert(task.id.clone());
                self.report
                    .assigned
                    .push((forklift.id.clone(), task.id.clone()));
                return;
            }
            debug!(forklift = %forklift.id, task = %task.id, "no route to task");
        }
    }

    /// End of route: deliver if carrying on the dropoff, otherwise give the
    /// task back.
    fn finish_route(&mut self, forklift: &mut Forklift) {
        let was_carrying = forklift.status == ForkliftStatus::Carrying;
        let task = self.task(forklift.current_task.as_ref());
        let delivered = was_carrying && task.is_some_and(|t| t.dropoff.position == forklift.position);
        let weight = task.map(|t| t.material.weight);

        forklift.go_idle();
        forklift.clear_blockage();

        if delivered {
            forklift.unload(weight.unwrap_or(0.0));
            forklift.tasks_completed += 1;
            debug!(forklift = %forklift.id, task = ?forklift.current_task, "delivered");
        } else if let Some(task_id) = forklift.current_task.take() {
            if was_carrying {
                forklift.unload(weight.unwrap_or(0.0));
            }
            warn!(forklift = %forklift.id, task = %task_id, "route ended before delivery, task released");
            self.report.abandoned.push(forklift.id.clone());
        }
    }
}

impl Simulation {
    /// Advances the simulation by one tick.
    ///
    /// Forklifts are processed in registry order against a snapshot of
    /// positions taken before anyone moves. Task statuses are then
    /// reconciled from forklift state, collisions counted, alerts aged and
    /// grid occupancy refreshed.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let footprints: Vec<Footprint> = self
            .registry
            .forklifts
            .iter()
            .map(Forklift::footprint)
            .collect();
        let mut report = TickReport {
            tick: self.tick_count + 1,
            ..TickReport::default()
        };

        {
            let Simulation {
                config,
                grid,
                registry,
                alerts,
                metrics,
                estimator,
                running,
                ..
            } = self;
            let mut pass = ForkliftPass {
                config,
                grid,
                tasks: &registry.tasks,
                footprints: &footprints,
                claimed: HashSet::new(),
                alerts,
                metrics,
                estimator: &mut **estimator,
                running: *running,
                now,
                report: &mut report,
            };
            for forklift in registry.forklifts.iter_mut() {
                pass.update(forklift);
            }
        }

        self.reconcile(now, &mut report);
        self.detect_collisions(now, &mut report);
        self.metrics.refresh_fleet(&self.registry.forklifts);
        report.alerts_resolved = self.alerts.age(now);
        self.grid
            .sync_occupancy(self.registry.forklifts.iter().map(|f| (&f.id, f.position)));

        self.tick_count += 1;
        if self.tick_count % EXPLORATION_DECAY_INTERVAL == 0 {
            self.estimator.decay_exploration();
        }
        debug!(
            tick = self.tick_count,
            assigned = report.assigned.len(),
            moved = report.moved,
            completed = report.completed.len(),
            "tick"
        );
        report
    }

    /// Counts a collision once per tick if any two forklifts share a cell.
    /// With emergency response on, every colliding pair raises an alert for
    /// each of its forklifts.
    fn detect_collisions(&mut self, now: Timestamp, report: &mut TickReport) {
        let forklifts = &self.registry.forklifts;
        let mut colliding = Vec::new();
        for (i, a) in forklifts.iter().enumerate() {
            for b in &forklifts[i + 1..] {
                if a.position == b.position {
                    colliding.push((a.id.clone(), a.position));
                    colliding.push((b.id.clone(), b.position));
                }
            }
        }
        if colliding.is_empty() {
            return;
        }
        report.collision = true;
        self.metrics.collision_count += 1;
        if !self.config.emergency_response {
            return;
        }
        for (id, pos) in colliding {
            let alert = EmergencyAlert::new(
                AlertKind::Collision,
                Severity::Critical,
                id,
                pos,
                format!("Collision detected at {pos}"),
                now,
            );
            if self.alerts.raise(alert) {
                report.alerts_raised += 1;
            }
        }
    }
}
