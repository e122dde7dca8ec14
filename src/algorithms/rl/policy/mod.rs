//! Value estimator trait and implementations.

pub mod q_learning;
pub mod trait_;

pub use q_learning::{QLearning, StateKey};
pub use trait_::ValueEstimator;
