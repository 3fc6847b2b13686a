use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetdag::errors::TaskError;
use assetdag::exec::{UnitFuture, UnitRunner};
use assetdag::pipeline::{OutputManifest, WrittenFile};

/// A [`UnitRunner`] that never touches the filesystem.
///
/// Every run is recorded in order; units can be made to fail or to take a
/// while so concurrency and skipping can be observed.
#[derive(Clone, Default)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<String>>>,
    failing: BTreeSet<String>,
    delays: BTreeMap<String, Duration>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, unit: &str) -> Self {
        self.failing.insert(unit.to_string());
        self
    }

    pub fn delay(mut self, unit: &str, delay: Duration) -> Self {
        self.delays.insert(unit.to_string(), delay);
        self
    }

    /// Units in the order they started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl UnitRunner for FakeRunner {
    fn run_unit<'a>(&'a self, name: &'a str) -> UnitFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(name.to_string());
            if let Some(delay) = self.delays.get(name) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.contains(name) {
                return Err(TaskError::new(
                    name,
                    "fake",
                    anyhow::anyhow!("{name} failed on purpose"),
                ));
            }
            Ok(OutputManifest {
                unit: name.to_string(),
                files: vec![WrittenFile {
                    rel_path: format!("{name}.out"),
                    hash: String::new(),
                    changed: true,
                }],
            })
        })
    }
}
