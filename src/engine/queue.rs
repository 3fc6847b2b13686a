// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use super::TaskName;

/// Reruns requested while a unit was already running.
///
/// Triggers are coalesced per unit: however many changes arrive during a
/// run, the unit reruns once after it finishes.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: BTreeSet<TaskName>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no queued reruns.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, task: &str) -> bool {
        self.pending.contains(task)
    }

    /// Record a rerun for `task`. Returns false if one was already queued.
    pub fn record_trigger(&mut self, task: &str) -> bool {
        let inserted = self.pending.insert(task.to_string());
        debug!(task = %task, inserted, "queued rerun for running unit");
        inserted
    }

    /// Remove and return whether a rerun was queued for `task`.
    pub fn take(&mut self, task: &str) -> bool {
        self.pending.remove(task)
    }
}
