//! Data models.
//!
//! - Plan / PlanType (five-rank goal tree)
//! - Task / DayWindow (daily missions)
//! - Stats (completion pairs)
//! - PlanNode (assembled tree)

pub mod plan;
pub mod stats;
pub mod task;
pub mod tree;

pub use plan::{Plan, PlanType};
pub use stats::Stats;
pub use task::{DayWindow, Task};
pub use tree::{PlanNode, build_forest};
