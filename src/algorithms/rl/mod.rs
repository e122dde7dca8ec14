//! Tabular value estimation over grid moves.
//!
//! The estimator never drives movement: A* routes every forklift. The
//! scheduler decays its exploration rate every ten ticks and, when
//! `learn_from_moves` is enabled, feeds it one temporal-difference update per
//! executed move.

pub mod policy;
pub mod reward;

pub use policy::{QLearning, StateKey, ValueEstimator};
pub use reward::RewardComputer;
