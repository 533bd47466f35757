//! Planning and applying configuration changes.
//!
//! This module compares desired and observed configuration lines, builds
//! change plans, and applies planned actions in a locked write cycle.

mod diff;
mod executor;
mod plan;

pub use diff::{DiffEngine, DiffType, ResourceDiff};
pub use executor::{ExecutionResult, PlanExecutor};
pub use plan::{ActionType, ChangePlan, PlannedAction};
