// src/engine/mod.rs

//! Watch-mode orchestration engine.
//!
//! This module ties together:
//! - the unit DAG (for propagating successful rebuilds to dependents)
//! - the trigger queue (re-triggers that arrive while a unit is running)
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - unit completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical unit name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a unit run as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

/// Why a unit was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Explicit trigger (e.g. from the CLI or a test).
    Manual,
    /// Debounced filesystem change.
    FileWatch,
    /// A dependency finished successfully.
    Upstream,
}

/// Runtime options used by both the core and the async shell.
///
/// The CLI's `watch` and `dev` loops run with the defaults and stop only on
/// Ctrl-C. [`RuntimeOptions::one_shot`] is for drivers that feed a fixed set
/// of triggers and want `Runtime::run` to return once they have settled,
/// such as embedders and the runtime integration tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit once nothing is running or queued.
    pub exit_when_idle: bool,
}

impl RuntimeOptions {
    /// Options that end the runtime as soon as it goes idle.
    pub fn one_shot() -> Self {
        Self {
            exit_when_idle: true,
        }
    }
}

/// Events flowing into the runtime from the watcher and executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A unit should run.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// A unit run finished.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
