// src/watch/debounce.rs

//! Pure debouncing state machine.
//!
//! ```text
//! Idle --change--> Detecting --matched--> Debouncing --quiet--> Dispatching --> Idle
//!                      |                      ^    |
//!                      +--no match--> Idle    +----+ change (deadline reset)
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::engine::TaskName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Detecting,
    Debouncing,
    Dispatching,
}

/// Collects units triggered by a burst of changes and releases them once
/// the burst has been quiet for `interval`.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    state: WatchState,
    pending: BTreeSet<TaskName>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: WatchState::Idle,
            pending: BTreeSet::new(),
            deadline: None,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// When the pending units should be dispatched, if any are pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn pending(&self) -> &BTreeSet<TaskName> {
        &self.pending
    }

    /// Record one filesystem change and the units it matched.
    ///
    /// Any match pushes the deadline back to `now + interval`.
    pub fn record<I>(&mut self, units: I, now: Instant)
    where
        I: IntoIterator<Item = TaskName>,
    {
        let previous = self.state;
        self.state = WatchState::Detecting;

        let before = self.pending.len();
        let mut matched = false;
        for unit in units {
            matched = true;
            self.pending.insert(unit);
        }

        if matched {
            self.deadline = Some(now + self.interval);
            self.state = WatchState::Debouncing;
        } else if previous == WatchState::Debouncing {
            self.state = WatchState::Debouncing;
        } else {
            self.state = WatchState::Idle;
        }
        let added = self.pending.len() - before;
        trace!(?previous, state = ?self.state, added, pending = self.pending.len(), "recorded change");
    }

    /// Release the pending units if the deadline has passed.
    pub fn flush(&mut self, now: Instant) -> Option<BTreeSet<TaskName>> {
        match self.deadline {
            Some(deadline) if now >= deadline => Some(self.drain()),
            _ => None,
        }
    }

    /// Release the pending units regardless of the deadline.
    pub fn drain(&mut self) -> BTreeSet<TaskName> {
        self.state = WatchState::Dispatching;
        let units = std::mem::take(&mut self.pending);
        self.deadline = None;
        self.state = WatchState::Idle;
        units
    }
}
