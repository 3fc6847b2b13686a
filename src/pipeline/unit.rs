// src/pipeline/unit.rs

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::config::model::{ConfigFile, TaskConfig};
use crate::config::validate::unit_output_dir;
use crate::errors::{AssetdagError, Result, TaskError};
use crate::paths::normalize::relative_str;
use crate::paths::PatternMatcher;
use crate::pipeline::steps::build_step;
use crate::pipeline::write::{OutputManifest, write_outputs};
use crate::pipeline::{Asset, StepContext, Transform, blocking};
use crate::types::{PathRole, ReloadMode};

/// A named, immutable build unit: input category, ordered steps and output
/// directory.
pub struct TaskUnit {
    name: String,
    input: String,
    output_dir: String,
    matcher: PatternMatcher,
    steps: Vec<Box<dyn Transform>>,
    reload: ReloadMode,
    after: Vec<String>,
}

impl fmt::Debug for TaskUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<_> = self.steps.iter().map(|s| s.name()).collect();
        f.debug_struct("TaskUnit")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("output_dir", &self.output_dir)
            .field("steps", &steps)
            .field("reload", &self.reload)
            .field("after", &self.after)
            .finish()
    }
}

impl TaskUnit {
    pub fn from_config(name: &str, task: &TaskConfig, cfg: &ConfigFile) -> Result<Self> {
        let resolver = cfg.resolver();
        let matcher = resolver.matcher(&task.input, PathRole::Source)?;
        let output_dir = unit_output_dir(resolver, task)?;

        let steps = task
            .steps
            .iter()
            .map(|step| {
                build_step(step).map_err(|e| {
                    AssetdagError::ConfigError(format!(
                        "task '{name}', step '{}': {e:#}",
                        step.kind()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            input: task.input.clone(),
            output_dir,
            matcher,
            steps,
            reload: task.reload,
            after: task.after.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Output directory relative to the output root (`""` is the root).
    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn reload(&self) -> ReloadMode {
        self.reload
    }

    pub fn after(&self) -> &[String] {
        &self.after
    }

    pub fn step_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|s| s.name())
    }

    /// Read the unit's input files in sorted order.
    ///
    /// Asset paths are relative to the category's base directory, so
    /// `src/images/icons/a.png` lands in `<output_dir>/icons/a.png`. Files
    /// inside `output_root` are skipped when it is nested in the source tree,
    /// unless the category itself is rooted inside the output root.
    pub async fn collect_inputs(
        &self,
        source_root: &Path,
        output_root: &Path,
    ) -> anyhow::Result<Vec<Asset>> {
        let matcher = self.matcher.clone();
        let source_root = source_root.to_path_buf();
        let output_root = output_root.to_path_buf();

        blocking(move || {
            let files = matcher.collect_files(&source_root)?;
            let base_dir: PathBuf = source_root.join(matcher.base());
            let reads_output = base_dir.starts_with(&output_root);

            files
                .into_iter()
                .filter(|path| reads_output || !path.starts_with(&output_root))
                .map(|path| -> anyhow::Result<Asset> {
                    let rel = relative_str(&base_dir, &path)
                        .with_context(|| format!("{:?} is outside {:?}", path, base_dir))?;
                    let contents =
                        fs::read(&path).with_context(|| format!("reading {:?}", path))?;
                    Ok(Asset::new(rel, contents).with_source(path))
                })
                .collect()
        })
        .await
    }

    /// Run every step in memory, then write the result.
    ///
    /// Nothing is written if any step fails.
    pub async fn run(
        &self,
        source_root: &Path,
        output_root: &Path,
    ) -> std::result::Result<OutputManifest, TaskError> {
        let ctx = StepContext {
            unit: self.name.clone(),
            source_root: source_root.to_path_buf(),
        };

        let mut assets = self
            .collect_inputs(source_root, output_root)
            .await
            .map_err(|e| TaskError::new(&self.name, "collect", e))?;
        debug!(unit = %self.name, inputs = assets.len(), "collected inputs");

        for step in &self.steps {
            assets = step
                .apply(&ctx, assets)
                .await
                .map_err(|e| TaskError::new(&self.name, step.name(), e))?;
            debug!(unit = %self.name, step = step.name(), assets = assets.len(), "step done");
        }

        let unit = self.name.clone();
        let output_root = output_root.to_path_buf();
        let out_dir = self.output_dir.clone();
        tokio::task::spawn_blocking(move || write_outputs(&unit, &output_root, &out_dir, &assets))
            .await
            .map_err(|e| anyhow::anyhow!("writer panicked: {e}"))
            .and_then(|res| res)
            .map_err(|e| TaskError::new(&self.name, "write", e))
    }
}
