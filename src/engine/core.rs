// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, handing units to the executor backend and handling
//! shutdown. The core is unit tested without any Tokio, channels,
//! filesystem or processes.

use std::collections::BTreeSet;

use crate::dag::DagGraph;
use crate::engine::event_handlers::{CoreStep, handle_task_completion, handle_task_trigger};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName};

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    graph: DagGraph,
    running: BTreeSet<TaskName>,
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(graph: DagGraph, options: RuntimeOptions) -> Self {
        Self {
            graph,
            running: BTreeSet::new(),
            queue: TriggerQueue::new(),
            options,
        }
    }

    /// True when no unit is running.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn is_running(&self, task: &str) -> bool {
        self.running.contains(task)
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => handle_task_trigger(
                &self.graph,
                &mut self.running,
                &mut self.queue,
                task,
                reason,
            ),
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &self.graph,
                &mut self.running,
                &mut self.queue,
                &self.options,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
