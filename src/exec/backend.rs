// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running units
//! itself. `RunnerBackend` is the production implementation: it runs each
//! unit on its own tokio task through a [`UnitRunner`] and reports the
//! outcome back as `RuntimeEvent::TaskCompleted`. Tests can provide their
//! own backend that records dispatched units.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::engine::{RuntimeEvent, TaskName, TaskOutcome};
use crate::errors::Result;
use crate::exec::runner::UnitRunner;

/// Trait abstracting how dispatched units are executed.
pub trait ExecutorBackend: Send {
    /// Start the given units. Must not wait for them to finish.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<TaskName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs units through a [`UnitRunner`] on background tokio tasks.
pub struct RunnerBackend {
    runner: Arc<dyn UnitRunner>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RunnerBackend {
    pub fn new(runner: Arc<dyn UnitRunner>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { runner, runtime_tx }
    }
}

impl ExecutorBackend for RunnerBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<TaskName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        for task in tasks {
            let runner = Arc::clone(&self.runner);
            let tx = self.runtime_tx.clone();
            tokio::spawn(async move {
                let outcome = match runner.run_unit(&task).await {
                    Ok(_) => TaskOutcome::Success,
                    Err(err) => {
                        error!(unit = %task, step = %err.step, "{err}");
                        TaskOutcome::Failed(err.to_string())
                    }
                };
                if tx
                    .send(RuntimeEvent::TaskCompleted { task, outcome })
                    .await
                    .is_err()
                {
                    debug!("runtime gone; dropping completion event");
                }
            });
        }
        Box::pin(async { Ok(()) })
    }
}
