// src/pipeline/mod.rs

//! Task units and their transform steps.
//!
//! A unit run is a pure in-memory pipeline followed by a single write phase:
//!
//! 1. [`unit::TaskUnit::collect_inputs`] reads the unit's source files.
//! 2. Each [`Transform`] maps the asset list to a new asset list.
//! 3. [`write::write_outputs`] writes the result atomically, skipping files
//!    whose content is unchanged.
//!
//! A failing step aborts the run before anything is written.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

pub mod runner;
pub mod steps;
pub mod unit;
pub mod write;

pub use runner::Pipeline;
pub use unit::TaskUnit;
pub use write::{OutputManifest, WrittenFile};

/// One file flowing through a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Destination path relative to the unit's output directory, with
    /// forward slashes.
    pub path: String,
    /// File the asset was read from, if any. Steps use it to resolve
    /// relative imports and includes.
    pub source: Option<PathBuf>,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            source: None,
            contents: contents.into(),
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Lowercased extension of the destination path, without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.path.rsplit('/').next()?;
        let (_, ext) = name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn text(&self) -> anyhow::Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| anyhow::anyhow!("{} is not valid UTF-8: {e}", self.path))
    }

    /// Replace the extension of the destination path.
    pub fn set_extension(&mut self, ext: &str) {
        let (dir, name) = match self.path.rsplit_once('/') {
            Some((dir, name)) => (Some(dir), name),
            None => (None, self.path.as_str()),
        };
        let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
        self.path = match dir {
            Some(dir) => format!("{dir}/{stem}.{ext}"),
            None => format!("{stem}.{ext}"),
        };
    }
}

/// Per-run information shared with every step.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub unit: String,
    pub source_root: PathBuf,
}

/// Future returned by [`Transform::apply`].
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Vec<Asset>>> + Send + 'a>>;

/// One transform step of a unit.
///
/// Implementations are built once from the validated configuration and are
/// shared between runs, so `apply` takes `&self`.
pub trait Transform: Send + Sync {
    /// Step kind as written in the config (`scss`, `concat`, ...).
    fn name(&self) -> &'static str;

    fn apply<'a>(&'a self, ctx: &'a StepContext, assets: Vec<Asset>) -> StepFuture<'a>;
}

/// Run CPU-bound step work off the async workers.
pub(crate) async fn blocking<F>(f: F) -> anyhow::Result<Vec<Asset>>
where
    F: FnOnce() -> anyhow::Result<Vec<Asset>> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("step worker panicked: {e}"))?
}
