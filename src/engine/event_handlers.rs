// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::dag::DagGraph;
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start these units.
    DispatchTasks(Vec<TaskName>),
    /// Nothing is running or queued and the runtime was asked to exit when
    /// idle.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(dispatch: Vec<TaskName>) -> Self {
        let mut commands = Vec::new();
        if !dispatch.is_empty() {
            commands.push(CoreCommand::DispatchTasks(dispatch));
        }
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a unit trigger.
///
/// - Unknown units are ignored.
/// - A unit that is already running gets one rerun queued.
/// - Otherwise the unit is dispatched immediately, concurrently with
///   whatever else is running.
pub fn handle_task_trigger(
    graph: &DagGraph,
    running: &mut BTreeSet<TaskName>,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    let mut dispatch = Vec::new();
    trigger(graph, running, queue, task, reason, &mut dispatch);
    CoreStep::continue_with(dispatch)
}

/// Handle a unit completion.
///
/// - A queued rerun is dispatched first; propagation to dependents waits
///   for that rerun to finish.
/// - On success, dependents are triggered unless another of their
///   dependencies is still running or queued (that one will trigger them
///   when it finishes).
/// - Failures are logged and never stop the runtime.
pub fn handle_task_completion(
    graph: &DagGraph,
    running: &mut BTreeSet<TaskName>,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    running.remove(&task);
    let mut dispatch = Vec::new();

    if let TaskOutcome::Failed(reason) = &outcome {
        warn!(task = %task, %reason, "unit failed; waiting for the next change");
    }

    if queue.take(&task) {
        debug!(task = %task, "starting queued rerun");
        running.insert(task.clone());
        dispatch.push(task);
    } else if outcome == TaskOutcome::Success {
        for dependent in graph.dependents_of(&task) {
            let blocked = graph
                .dependencies_of(dependent)
                .iter()
                .any(|dep| running.contains(dep) || queue.contains(dep));
            if blocked {
                debug!(task = %dependent, "dependent waits for other running dependencies");
                continue;
            }
            trigger(
                graph,
                running,
                queue,
                dependent.clone(),
                TriggerReason::Upstream,
                &mut dispatch,
            );
        }
    }

    let mut step = CoreStep::continue_with(dispatch);
    if options.exit_when_idle && running.is_empty() && queue.is_empty() {
        step.commands.push(CoreCommand::RequestExit);
        step.keep_running = false;
    }
    step
}

fn trigger(
    graph: &DagGraph,
    running: &mut BTreeSet<TaskName>,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
    dispatch: &mut Vec<TaskName>,
) {
    if !graph.contains(&task) {
        warn!(task = %task, ?reason, "ignoring trigger for unknown unit");
        return;
    }
    if running.contains(&task) {
        queue.record_trigger(&task);
        return;
    }
    debug!(task = %task, ?reason, "dispatching unit");
    running.insert(task.clone());
    dispatch.push(task);
}
