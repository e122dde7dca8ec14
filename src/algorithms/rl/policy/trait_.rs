//! Value estimator trait for the scheduler.

use crate::config::SimulationConfig;
use crate::grid::Position;

/// A learner that scores moves from a position toward a goal.
///
/// Actions are the neighbouring cells a forklift may step into. States are
/// `(position, goal)` pairs.
pub trait ValueEstimator: Send {
    /// Picks one of `actions`, or `None` when there are no actions.
    fn select_action(
        &mut self,
        position: Position,
        goal: Position,
        actions: &[Position],
    ) -> Option<Position>;

    /// Applies one temporal-difference update for moving from `position` to
    /// `action` while heading to `goal`.
    ///
    /// `next_actions` are the moves available from `action`; the bootstrap
    /// term is zero when it is empty.
    fn update_q_value(
        &mut self,
        position: Position,
        goal: Position,
        action: Position,
        reward: f64,
        next_actions: &[Position],
    );

    /// Shrinks the exploration rate.
    fn decay_exploration(&mut self);

    /// Current exploration rate.
    fn exploration_rate(&self) -> f64;

    /// Picks up learning and discount rates from a new configuration.
    fn apply_config(&mut self, config: &SimulationConfig);

    /// Number of states with at least one learned value.
    fn state_count(&self) -> usize;

    /// Returns a human-readable name for this estimator.
    fn name(&self) -> &str;
}
