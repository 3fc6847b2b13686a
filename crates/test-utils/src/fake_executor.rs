use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetdag::engine::{RuntimeEvent, TaskName, TaskOutcome};
use assetdag::errors::Result;
use assetdag::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// A fake executor backend that:
/// - records which units were dispatched
/// - immediately reports `TaskCompleted` for each, failing the units listed
///   in `failing`.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<TaskName>>>,
    failing: Vec<TaskName>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<TaskName>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: Vec::new(),
        }
    }

    pub fn failing(mut self, unit: &str) -> Self {
        self.failing.push(unit.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<TaskName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for task in tasks {
                executed.lock().unwrap().push(task.clone());

                let outcome = if failing.contains(&task) {
                    TaskOutcome::Failed(format!("{task} failed on purpose"))
                } else {
                    TaskOutcome::Success
                };
                // Completion events go through a spawned task: the runtime
                // is busy awaiting this future and the channel is bounded.
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(RuntimeEvent::TaskCompleted { task, outcome }).await;
                });
            }
            Ok(())
        })
    }
}
