use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::trait_::ValueEstimator;
use crate::config::SimulationConfig;
use crate::grid::Position;

/// `(position, goal)`.
pub type StateKey = (Position, Position);

/// Lower bound for the exploration rate.
pub const MIN_EXPLORATION: f64 = 0.01;
/// Multiplicative exploration decay per call to `decay_exploration`.
pub const EXPLORATION_DECAY: f64 = 0.995;

/// Tabular ε-greedy Q-learning.
///
/// Unvisited state/action pairs are valued at 0. Greedy ties go to the
/// earliest action in the offered slice.
#[derive(Debug)]
pub struct QLearning {
    table: HashMap<StateKey, HashMap<Position, f64>>,
    learning_rate: f64,
    discount_factor: f64,
    exploration_rate: f64,
    rng: StdRng,
}

impl QLearning {
    pub fn new(learning_rate: f64, discount_factor: f64, exploration_rate: f64, seed: u64) -> Self {
        Self {
            table: HashMap::new(),
            learning_rate,
            discount_factor,
            exploration_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builds an estimator with the rates from `config`.
    pub fn from_config(config: &SimulationConfig, seed: u64) -> Self {
        Self::new(
            config.learning_rate,
            config.discount_factor,
            config.exploration_rate,
            seed,
        )
    }

    /// Learned value of taking `action` from `position` toward `goal`.
    pub fn q_value(&self, position: Position, goal: Position, action: Position) -> f64 {
        self.table
            .get(&(position, goal))
            .and_then(|actions| actions.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    fn best_value(&self, state: StateKey, actions: &[Position]) -> Option<f64> {
        let values = self.table.get(&state);
        actions
            .iter()
            .map(|a| values.and_then(|v| v.get(a)).copied().unwrap_or(0.0))
            .fold(None, |best: Option<f64>, q| {
                Some(best.map_or(q, |b| b.max(q)))
            })
    }
}

impl ValueEstimator for QLearning {
    fn select_action(
        &mut self,
        position: Position,
        goal: Position,
        actions: &[Position],
    ) -> Option<Position> {
        if actions.is_empty() {
            return None;
        }
        if self.rng.gen::<f64>() < self.exploration_rate {
            return Some(actions[self.rng.gen_range(0..actions.len())]);
        }
        let mut best = actions[0];
        let mut best_q = f64::NEG_INFINITY;
        for &action in actions {
            let q = self.q_value(position, goal, action);
            if q > best_q {
                best_q = q;
                best = action;
            }
        }
        Some(best)
    }

    fn update_q_value(
        &mut self,
        position: Position,
        goal: Position,
        action: Position,
        reward: f64,
        next_actions: &[Position],
    ) {
        let max_next = self.best_value((action, goal), next_actions).unwrap_or(0.0);
        let current = self.q_value(position, goal, action);
        let updated = current
            + self.learning_rate * (reward + self.discount_factor * max_next - current);
        self.table
            .entry((position, goal))
            .or_default()
            .insert(action, updated);
    }

    fn decay_exploration(&mut self) {
        self.exploration_rate = (self.exploration_rate * EXPLORATION_DECAY).max(MIN_EXPLORATION);
    }

    fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    fn apply_config(&mut self, config: &SimulationConfig) {
        self.learning_rate = config.learning_rate;
        self.discount_factor = config.discount_factor;
    }

    fn state_count(&self) -> usize {
        self.table.len()
    }

    fn name(&self) -> &str {
        "q-learning"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn empty_actions_select_nothing() {
        let mut q = QLearning::new(0.1, 0.9, 0.3, 7);
        assert_eq!(q.select_action(p(0, 0), p(5, 5), &[]), None);
    }

    #[test]
    fn greedy_picks_highest_value() {
        let mut q = QLearning::new(0.5, 0.9, 0.0, 7);
        q.update_q_value(p(1, 1), p(5, 1), p(2, 1), 10.0, &[]);
        q.update_q_value(p(1, 1), p(5, 1), p(1, 2), -5.0, &[]);
        let actions = [p(1, 2), p(2, 1), p(0, 1)];
        assert_eq!(q.select_action(p(1, 1), p(5, 1), &actions), Some(p(2, 1)));
    }

    #[test]
    fn greedy_ties_go_to_first_action() {
        let mut q = QLearning::new(0.5, 0.9, 0.0, 7);
        let actions = [p(3, 3), p(4, 4)];
        assert_eq!(q.select_action(p(0, 0), p(9, 9), &actions), Some(p(3, 3)));
    }

    #[test]
    fn td_update_uses_bootstrap() {
        let mut q = QLearning::new(0.5, 0.9, 0.0, 1);
        // seed the next state so max Q(s', .) = 10 * 0.5 = 5
        q.update_q_value(p(2, 1), p(5, 1), p(3, 1), 10.0, &[]);
        assert!((q.q_value(p(2, 1), p(5, 1), p(3, 1)) - 5.0).abs() < 1e-12);

        q.update_q_value(p(1, 1), p(5, 1), p(2, 1), 10.0, &[p(3, 1), p(1, 1)]);
        // 0 + 0.5 * (10 + 0.9 * 5 - 0) = 7.25
        assert!((q.q_value(p(1, 1), p(5, 1), p(2, 1)) - 7.25).abs() < 1e-12);
        assert_eq!(q.state_count(), 2);
    }

    #[test]
    fn exploration_decays_to_floor() {
        let mut q = QLearning::new(0.1, 0.9, 0.3, 1);
        q.decay_exploration();
        assert!((q.exploration_rate() - 0.2985).abs() < 1e-12);
        for _ in 0..5_000 {
            q.decay_exploration();
        }
        assert_eq!(q.exploration_rate(), MIN_EXPLORATION);
    }

    #[test]
    fn full_exploration_stays_within_actions() {
        let mut q = QLearning::new(0.1, 0.9, 1.0, 42);
        let actions = [p(0, 1), p(1, 0)];
        for _ in 0..50 {
            let a = q.select_action(p(0, 0), p(3, 3), &actions).unwrap();
            assert!(actions.contains(&a));
        }
    }

    #[test]
    fn apply_config_keeps_exploration() {
        let mut q = QLearning::new(0.1, 0.9, 0.3, 1);
        q.decay_exploration();
        let config = SimulationConfig {
            learning_rate: 0.5,
            discount_factor: 0.5,
            exploration_rate: 1.0,
            ..SimulationConfig::default()
        };
        q.apply_config(&config);
        assert!(q.exploration_rate() < 0.3);
        assert_eq!(q.name(), "q-learning");
    }
}
