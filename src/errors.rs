// src/errors.rs

//! Crate-wide error types.
//!
//! Failures are kept local to the task unit that produced them whenever
//! possible; only [`BuildFailure`] surfaces at the top level as a non-zero
//! process exit.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("Unknown task unit: {0}")]
    UnitNotFound(String),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Clean(#[from] CleanError),

    #[error(transparent)]
    Build(#[from] BuildFailure),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single transform step of a task unit failed.
///
/// The unit wrote nothing for this run.
#[derive(Error, Debug)]
#[error("unit '{unit}' failed in step '{step}': {cause:#}")]
pub struct TaskError {
    pub unit: String,
    pub step: String,
    pub cause: anyhow::Error,
}

impl TaskError {
    pub fn new(unit: impl Into<String>, step: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            unit: unit.into(),
            step: step.into(),
            cause,
        }
    }
}

/// Some entries under the output root could not be removed.
#[derive(Error, Debug)]
pub struct CleanError {
    pub root: PathBuf,
    pub failures: Vec<(PathBuf, String)>,
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not remove {} path(s) under {}",
            self.failures.len(),
            self.root.display()
        )?;
        for (path, reason) in &self.failures {
            write!(f, "; {}: {}", path.display(), reason)?;
        }
        Ok(())
    }
}

/// Aggregate failure of a build: every unit that failed, plus the units that
/// never ran because an earlier group failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build failed: {}", self.failed.join(", "))?;
        if !self.skipped.is_empty() {
            write!(f, " (skipped: {})", self.skipped.join(", "))?;
        }
        Ok(())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetdagError>;
