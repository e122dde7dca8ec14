//! Single-cell movement shared by the automatic tick and manual stepping.

use crate::algorithms::pathfinding::{find_alternate_path, find_path, Contention, Footprint};
use crate::algorithms::rl::{RewardComputer, ValueEstimator};
use crate::clock::Timestamp;
use crate::fleet::{Forklift, ForkliftStatus, Task};
use crate::grid::{Grid, Position};
use crate::metrics::FleetMetrics;

/// How far `last_move_time` is pushed back each time a forklift is blocked.
pub const BLOCKED_BACKDATE_MS: u64 = 5_000;

const PICKUP_FUEL: f64 = 0.15;
const PICKUP_BATTERY: f64 = 0.1;
const DROPOFF_FUEL: f64 = 0.15;
const DROPOFF_BATTERY: f64 = 0.1;
const STEP_FUEL: f64 = 0.1;
const STEP_BATTERY: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Advance,
    /// Entered the pickup cell and loaded the material.
    Pickup,
    /// Entered the dropoff cell; the delivery completes on the next tick.
    Dropoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    /// Target of the leg being travelled, when the forklift has a task.
    pub goal: Option<Position>,
    pub kind: MoveKind,
}

/// Result of asking a forklift to take its next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved(Move),
    /// The next cell was unavailable and a new route was adopted.
    Rerouted,
    /// The next cell was unavailable and no alternative exists.
    Blocked,
}

impl StepOutcome {
    pub fn movement(&self) -> Option<&Move> {
        match self {
            StepOutcome::Moved(m) => Some(m),
            _ => None,
        }
    }
}

pub(crate) struct MoveContext<'a> {
    pub grid: &'a Grid,
    pub footprints: &'a [Footprint],
    pub collision_avoidance: bool,
    pub now: Timestamp,
}

/// Plain A* first, then the alternate-path escalation.
pub(crate) fn plan_route(
    grid: &Grid,
    from: Position,
    to: Position,
    contention: &Contention<'_>,
) -> Vec<Position> {
    let path = find_path(grid, from, to, contention);
    if !path.is_empty() {
        return path;
    }
    find_alternate_path(grid, from, to, contention, &[])
}

/// Pickup while moving, dropoff while carrying.
fn leg_target(status: ForkliftStatus, task: &Task) -> Option<Position> {
    match status {
        ForkliftStatus::Moving => Some(task.pickup.position),
        ForkliftStatus::Carrying => Some(task.dropoff.position),
        _ => None,
    }
}

/// Puts `forklift` to work on `task`.
///
/// A forklift already standing on the pickup loads at once and heads for
/// the dropoff. Returns false, leaving the forklift untouched, when no route
/// exists.
pub(crate) fn begin_task(
    forklift: &mut Forklift,
    task: &Task,
    grid: &Grid,
    footprints: &[Footprint],
    now: Timestamp,
) -> bool {
    let id = forklift.id.clone();
    let contention = Contention::new(footprints, &id);
    let at_pickup = forklift.position == task.pickup.position;
    let target = if at_pickup {
        task.dropoff.position
    } else {
        task.pickup.position
    };
    let path = plan_route(grid, forklift.position, target, &contention);
    if path.is_empty() {
        return false;
    }
    if at_pickup {
        forklift.current_load += task.material.weight;
        forklift.status = ForkliftStatus::Carrying;
    } else {
        forklift.status = ForkliftStatus::Moving;
    }
    forklift.path = path;
    forklift.current_task = Some(task.id.clone());
    forklift.last_move_time = now;
    forklift.clear_blockage();
    tracing::debug!(
        forklift = %forklift.id,
        task = %task.id,
        status = %forklift.status,
        steps = forklift.path.len() - 1,
        "task started"
    );
    true
}

/// Moves `forklift` one cell along its path.
///
/// An unavailable next cell (another forklift on it with collision
/// avoidance on, or a cell edited into a shelf or obstacle) triggers a
/// reroute toward the current leg's target; failing that the forklift waits
/// and its `last_move_time` is pushed back so a persistent blockage is
/// reported as stuck.
pub(crate) fn advance(
    forklift: &mut Forklift,
    task: Option<&Task>,
    ctx: &MoveContext<'_>,
    metrics: &mut FleetMetrics,
) -> StepOutcome {
    let Some(next) = forklift.next_step() else {
        return StepOutcome::Blocked;
    };
    let id = forklift.id.clone();
    let contention = Contention::new(ctx.footprints, &id);
    let goal = task.and_then(|t| leg_target(forklift.status, t));

    let occupied = ctx.collision_avoidance && contention.is_occupied(next);
    if occupied || !ctx.grid.is_traversable(next) {
        if let Some(goal) = goal {
            let path = find_alternate_path(ctx.grid, forklift.position, goal, &contention, &[next]);
            if !path.is_empty() {
                tracing::debug!(forklift = %forklift.id, blocked = %next, "rerouted");
                forklift.path = path;
                forklift.last_move_time = ctx.now;
                return StepOutcome::Rerouted;
            }
        }
        tracing::debug!(forklift = %forklift.id, blocked = %next, "waiting for cell to clear");
        forklift.last_move_time = forklift.last_move_time.saturating_sub(BLOCKED_BACKDATE_MS);
        return StepOutcome::Blocked;
    }

    let from = forklift.position;
    forklift.position = next;
    forklift.path.remove(0);
    forklift.total_distance += 1;
    forklift.total_time_ms += ctx.now.saturating_sub(forklift.last_move_time);
    forklift.last_move_time = ctx.now;

    let kind = match task {
        Some(t) if forklift.status == ForkliftStatus::Moving && next == t.pickup.position => {
            forklift.current_load += t.material.weight;
            forklift.status = ForkliftStatus::Carrying;
            forklift.path = plan_route(ctx.grid, next, t.dropoff.position, &contention);
            forklift.drain(PICKUP_FUEL, PICKUP_BATTERY);
            tracing::debug!(forklift = %forklift.id, task = %t.id, at = %next, "picked up");
            MoveKind::Pickup
        }
        Some(t) if forklift.status == ForkliftStatus::Carrying && next == t.dropoff.position => {
            forklift.path.truncate(1);
            metrics.total_weight_moved += t.material.weight;
            forklift.drain(DROPOFF_FUEL, DROPOFF_BATTERY);
            tracing::debug!(forklift = %forklift.id, task = %t.id, at = %next, "reached dropoff");
            MoveKind::Dropoff
        }
        _ => {
            forklift.drain(STEP_FUEL, STEP_BATTERY);
            MoveKind::Advance
        }
    };

    StepOutcome::Moved(Move {
        from,
        to: next,
        goal,
        kind,
    })
}

/// Feeds one executed move to the value estimator.
pub(crate) fn learn_from_move(estimator: &mut dyn ValueEstimator, grid: &Grid, mv: &Move) {
    let Some(goal) = mv.goal else {
        return;
    };
    let reward = RewardComputer::compute(mv.from, mv.to, goal, mv.kind == MoveKind::Dropoff);
    let next_actions = grid.traversable_neighbors(mv.to);
    estimator.update_q_value(mv.from, goal, mv.to, reward, &next_actions);
}
