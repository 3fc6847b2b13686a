// src/dag/mod.rs

//! Task graph composition and execution.
//!
//! - [`graph`] holds the dependency graph of units (`after` edges).
//! - [`plan`] turns it into an [`ExecutionPlan`] of sequential groups.
//! - [`executor`] runs a plan through a [`crate::exec::UnitRunner`].

pub mod executor;
pub mod graph;
pub mod plan;

pub use executor::{PlanReport, execute_plan};
pub use graph::DagGraph;
pub use plan::ExecutionPlan;
