// src/pipeline/runner.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::config::model::ConfigFile;
use crate::errors::{AssetdagError, Result, TaskError};
use crate::exec::{UnitFuture, UnitRunner};
use crate::pipeline::unit::TaskUnit;
use crate::pipeline::write::OutputManifest;
use crate::server::{ReloadEvent, ReloadKind};
use crate::types::ReloadMode;

/// All task units of a configuration, runnable by name.
///
/// When a reload channel is attached, every run that changed output of a
/// unit with `reload != none` sends a [`ReloadEvent`].
#[derive(Debug)]
pub struct Pipeline {
    config: Arc<ConfigFile>,
    units: BTreeMap<String, Arc<TaskUnit>>,
    reload_tx: Option<mpsc::Sender<ReloadEvent>>,
}

impl Pipeline {
    pub fn new(config: Arc<ConfigFile>) -> Result<Self> {
        let units = config
            .tasks()
            .iter()
            .map(|(name, task)| {
                TaskUnit::from_config(name, task, &config).map(|u| (name.clone(), Arc::new(u)))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            config,
            units,
            reload_tx: None,
        })
    }

    pub fn with_reload_channel(mut self, tx: mpsc::Sender<ReloadEvent>) -> Self {
        self.reload_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn unit(&self, name: &str) -> Option<&TaskUnit> {
        self.units.get(name).map(|u| u.as_ref())
    }

    pub fn units(&self) -> impl Iterator<Item = &TaskUnit> {
        self.units.values().map(|u| u.as_ref())
    }

    /// Run one unit and publish its reload event.
    pub async fn run(&self, name: &str) -> std::result::Result<OutputManifest, TaskError> {
        let unit = self.units.get(name).ok_or_else(|| {
            TaskError::new(
                name,
                "lookup",
                AssetdagError::UnitNotFound(name.to_string()).into(),
            )
        })?;

        let started = Instant::now();
        info!(unit = %name, "unit started");
        let manifest = unit
            .run(&self.config.source_root(), &self.config.output_root())
            .await?;

        let changed = manifest.changed().count();
        info!(
            unit = %name,
            outputs = manifest.files.len(),
            changed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "unit finished"
        );

        if let Some(event) = reload_event_for(unit, &manifest) {
            self.publish(event);
        }
        Ok(manifest)
    }

    /// Hand `event` to the notifier without waiting; a unit run never
    /// blocks on reload delivery.
    fn publish(&self, event: ReloadEvent) {
        let Some(tx) = &self.reload_tx else {
            return;
        };
        debug!(unit = %event.unit, kind = ?event.kind, "publishing reload event");
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(unit = %event.unit, "reload channel full; dropping reload event");
            }
            Err(TrySendError::Closed(_)) => {
                warn!("reload channel closed; dropping reload event");
            }
        }
    }
}

impl UnitRunner for Pipeline {
    fn run_unit<'a>(&'a self, name: &'a str) -> UnitFuture<'a> {
        Box::pin(self.run(name))
    }
}

/// `inject` only applies when every changed output is a stylesheet.
pub fn reload_event_for(unit: &TaskUnit, manifest: &OutputManifest) -> Option<ReloadEvent> {
    let paths: Vec<String> = manifest.changed().map(|f| f.rel_path.clone()).collect();
    if paths.is_empty() {
        return None;
    }

    let kind = match unit.reload() {
        ReloadMode::None => return None,
        ReloadMode::Full => ReloadKind::Full,
        ReloadMode::Inject if paths.iter().all(|p| p.ends_with(".css")) => ReloadKind::Inject,
        ReloadMode::Inject => ReloadKind::Full,
    };

    Some(ReloadEvent {
        unit: unit.name().to_string(),
        kind,
        paths,
    })
}
