//! Routing and learning algorithms used by the scheduler.
//!
//! * [`pathfinding`]: contention-aware A* routing over the warehouse grid.
//! * [`rl`]: tabular value estimation carried alongside the scheduler.

pub mod pathfinding;
pub mod rl;

pub use pathfinding::{find_alternate_path, find_path, Contention, Footprint};
pub use rl::{QLearning, RewardComputer, ValueEstimator};
