//! Reward shaping for grid moves.

use crate::grid::Position;

/// Reward for finishing a task.
pub const COMPLETION_REWARD: f64 = 100.0;
/// Reward for a move that shortens the Manhattan distance to the goal.
pub const PROGRESS_REWARD: f64 = 10.0;
/// Penalty for a move that lengthens it.
pub const REGRESS_PENALTY: f64 = -5.0;
/// Penalty for a move that keeps it unchanged.
pub const TIME_PENALTY: f64 = -1.0;

/// Computes move rewards for the value estimator.
pub struct RewardComputer;

impl RewardComputer {
    /// Reward for stepping from `current` to `next` while heading to `goal`.
    pub fn compute(current: Position, next: Position, goal: Position, completed: bool) -> f64 {
        if completed {
            return COMPLETION_REWARD;
        }
        let before = current.manhattan(&goal);
        let after = next.manhattan(&goal);
        if after < before {
            PROGRESS_REWARD
        } else if after > before {
            REGRESS_PENALTY
        } else {
            TIME_PENALTY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_dominates() {
        let p = Position::new(0, 0);
        assert_eq!(RewardComputer::compute(p, p, Position::new(9, 9), true), 100.0);
    }

    #[test]
    fn shaping_by_distance() {
        let goal = Position::new(5, 0);
        let here = Position::new(2, 0);
        assert_eq!(RewardComputer::compute(here, Position::new(3, 0), goal, false), 10.0);
        assert_eq!(RewardComputer::compute(here, Position::new(1, 0), goal, false), -5.0);
        assert_eq!(RewardComputer::compute(here, Position::new(2, 1), goal, false), -5.0);
        assert_eq!(RewardComputer::compute(here, here, goal, false), -1.0);
    }
}
