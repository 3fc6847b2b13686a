// src/orchestrator.rs

//! Top-level lifecycles: clean, build, single units, watch, serve and the
//! default dev loop.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::model::ConfigFile;
use crate::dag::{DagGraph, ExecutionPlan, PlanReport, execute_plan};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::{CleanError, Result};
use crate::exec::{RunnerBackend, UnitRunner};
use crate::pipeline::Pipeline;
use crate::server::{ReloadEvent, ReloadNotifier, serve};
use crate::types::PathRole;
use crate::watch::{WatchSettings, build_bindings, spawn_watcher};

/// Entries removed by a successful [`clean_output_root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub root: PathBuf,
    pub removed: usize,
}

/// Remove every entry below `root` but keep `root` itself, creating it if
/// it does not exist yet.
///
/// Removal continues past individual failures; all of them are reported in
/// the returned [`CleanError`].
pub fn clean_output_root(root: &Path) -> std::result::Result<CleanReport, CleanError> {
    let fail = |path: &Path, err: std::io::Error| CleanError {
        root: root.to_path_buf(),
        failures: vec![(path.to_path_buf(), err.to_string())],
    };

    fs::create_dir_all(root).map_err(|e| fail(root, e))?;
    let entries = fs::read_dir(root).map_err(|e| fail(root, e))?;

    let mut removed = 0;
    let mut failures = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                failures.push((root.to_path_buf(), e.to_string()));
                continue;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let res = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match res {
            Ok(()) => removed += 1,
            Err(e) => failures.push((path, e.to_string())),
        }
    }

    if failures.is_empty() {
        Ok(CleanReport {
            root: root.to_path_buf(),
            removed,
        })
    } else {
        Err(CleanError {
            root: root.to_path_buf(),
            failures,
        })
    }
}

/// Owns the validated configuration, its unit graph and the
/// clean-then-build plan.
#[derive(Debug)]
pub struct Orchestrator {
    config: Arc<ConfigFile>,
    graph: DagGraph,
    plan: ExecutionPlan,
}

impl Orchestrator {
    /// Derive the build plan and check that every unit's steps can be
    /// constructed, so misconfiguration fails before anything runs.
    pub fn new(config: Arc<ConfigFile>) -> Result<Self> {
        let graph = DagGraph::from_config(&config);
        let plan = ExecutionPlan::layered(&graph)?;
        Pipeline::new(Arc::clone(&config))?;
        Ok(Self {
            config,
            graph,
            plan,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    fn pipeline(&self, reload_tx: Option<mpsc::Sender<ReloadEvent>>) -> Result<Arc<Pipeline>> {
        let pipeline = Pipeline::new(Arc::clone(&self.config))?;
        Ok(Arc::new(match reload_tx {
            Some(tx) => pipeline.with_reload_channel(tx),
            None => pipeline,
        }))
    }

    pub fn clean(&self) -> std::result::Result<CleanReport, CleanError> {
        let report = clean_output_root(&self.config.output_root())?;
        info!(root = %report.root.display(), removed = report.removed, "output root cleaned");
        Ok(report)
    }

    /// Clean, then run the full plan with `runner`.
    ///
    /// A failed clean is logged and the build goes ahead on whatever is left.
    pub async fn clean_then_build(&self, runner: Arc<dyn UnitRunner>) -> PlanReport {
        if let Err(err) = self.clean() {
            error!("{err}");
        }
        execute_plan(&self.plan, runner).await
    }

    pub async fn build(&self) -> ExitCode {
        let runner = match self.pipeline(None) {
            Ok(p) => p,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        };
        report_exit(self.clean_then_build(runner).await)
    }

    /// Run only the named units (plus nothing they depend on), ordered by
    /// their mutual dependencies. The output root is not cleaned.
    pub async fn run_units(&self, names: &[String]) -> ExitCode {
        let plan = match ExecutionPlan::for_units(&self.graph, names) {
            Ok(plan) => plan,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        };
        let runner = match self.pipeline(None) {
            Ok(p) => p,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        };
        report_exit(execute_plan(&plan, runner).await)
    }

    /// Human-readable roots, categories, units and plan groups.
    pub fn describe(&self) -> String {
        let cfg = &self.config;
        let mut out = String::new();
        let _ = writeln!(out, "assetdag plan");
        let _ = writeln!(out, "  source_root = {}", cfg.source_root().display());
        let _ = writeln!(out, "  output_root = {}", cfg.output_root().display());
        let _ = writeln!(out, "  css = {:?}", cfg.settings().css);
        let _ = writeln!(out, "  debounce_ms = {}", cfg.settings().debounce_ms);
        let _ = writeln!(out);

        let _ = writeln!(out, "paths:");
        let resolver = cfg.resolver();
        for category in resolver.categories() {
            let _ = writeln!(out, "  - {category}");
            for role in [PathRole::Source, PathRole::Watch, PathRole::Build] {
                if let Ok(resolved) = resolver.resolve(category, role) {
                    let _ = writeln!(out, "      {role}: {:?}", resolved.patterns);
                }
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "units:");
        for (name, task) in cfg.tasks() {
            let steps: Vec<&str> = task.steps.iter().map(|s| s.kind()).collect();
            let _ = writeln!(out, "  - {name} (input: {})", task.input);
            if !steps.is_empty() {
                let _ = writeln!(out, "      steps: {}", steps.join(" -> "));
            }
            if !task.after.is_empty() {
                let _ = writeln!(out, "      after: {:?}", task.after);
            }
            let _ = writeln!(out, "      reload: {:?}", task.reload);
        }
        let _ = writeln!(out);

        let _ = write!(out, "{}", self.plan);
        out
    }

    /// Watch sources and rebuild affected units until Ctrl-C.
    pub async fn watch(&self) -> anyhow::Result<()> {
        let pipeline = self.pipeline(None)?;
        self.watch_loop(pipeline).await
    }

    /// Serve the output root with live reload until Ctrl-C. Nothing is
    /// rebuilt, so no reload is ever published.
    pub async fn serve(&self) -> anyhow::Result<()> {
        let server = serve(
            self.config.server(),
            self.config.output_root(),
            ReloadNotifier::new(),
        );
        tokio::select! {
            res = server => res,
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received; stopping dev server");
                Ok(())
            }
        }
    }

    /// Clean, build, then watch and serve until Ctrl-C. A failed initial
    /// build is logged and the loop starts anyway so the next edit can fix
    /// it.
    pub async fn dev(&self) -> anyhow::Result<()> {
        let notifier = ReloadNotifier::new();
        let (reload_tx, reload_rx) = mpsc::channel::<ReloadEvent>(64);
        let pipeline = self.pipeline(Some(reload_tx))?;

        let report = self.clean_then_build(pipeline.clone()).await;
        if let Err(failure) = report.into_result() {
            warn!("{failure}; continuing in watch mode");
        }

        let forwarder = tokio::spawn(notifier.clone().forward(reload_rx));
        let server = serve(self.config.server(), self.config.output_root(), notifier);

        let res = tokio::select! {
            res = server => res,
            res = self.watch_loop(pipeline) => res,
        };
        forwarder.abort();
        res
    }

    async fn watch_loop(&self, pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
        let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

        let settings = WatchSettings {
            source_root: self.config.source_root(),
            output_root: self.config.output_root(),
            debounce: Duration::from_millis(self.config.settings().debounce_ms),
        };
        let bindings = build_bindings(&self.config)?;
        let _watcher = spawn_watcher(settings, bindings, rt_tx.clone())
            .context("starting file watcher")?;

        // Ctrl-C -> graceful shutdown.
        {
            let tx = rt_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                    return;
                }
                let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
            });
        }

        let executor = RunnerBackend::new(pipeline, rt_tx);
        let core = CoreRuntime::new(self.graph.clone(), RuntimeOptions::default());
        Runtime::new(core, rt_rx, executor).run().await?;
        Ok(())
    }
}

fn report_exit(report: PlanReport) -> ExitCode {
    match report.into_result() {
        Ok(manifests) => {
            let changed: usize = manifests.iter().map(|m| m.changed().count()).sum();
            info!(units = manifests.len(), changed, "build finished");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!("{failure}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_keeps_root_and_removes_everything_below() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dist");
        fs::create_dir_all(root.join("css/nested")).unwrap();
        fs::write(root.join("index.html"), "x").unwrap();
        fs::write(root.join("css/nested/a.css"), "x").unwrap();

        let report = clean_output_root(&root).unwrap();
        assert_eq!(report.removed, 2);
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn clean_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dist");
        let report = clean_output_root(&root).unwrap();
        assert_eq!(report.removed, 0);
        assert!(root.is_dir());
    }

    #[test]
    fn clean_reports_root_that_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dist");
        fs::write(&root, "not a dir").unwrap();
        let err = clean_output_root(&root).unwrap_err();
        assert_eq!(err.failures.len(), 1);
    }
}
