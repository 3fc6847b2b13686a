// src/exec/mod.rs

//! Execution layer.
//!
//! - [`runner`] defines the [`UnitRunner`] seam that actually runs a unit.
//! - [`backend`] provides the `ExecutorBackend` trait the watch-mode runtime
//!   talks to, and a `RunnerBackend` that spawns unit runs on tokio and
//!   reports completion back as `RuntimeEvent`s.

pub mod backend;
pub mod runner;

pub use backend::{ExecutorBackend, RunnerBackend};
pub use runner::{UnitFuture, UnitRunner};
