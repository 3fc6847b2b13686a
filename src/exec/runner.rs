// src/exec/runner.rs

use std::future::Future;
use std::pin::Pin;

use crate::errors::TaskError;
use crate::pipeline::OutputManifest;

/// Future returned by [`UnitRunner::run_unit`].
pub type UnitFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<OutputManifest, TaskError>> + Send + 'a>>;

/// Runs a single task unit by name.
///
/// Both the plan executor and the watch-mode backend go through this seam,
/// so tests can substitute a fake that records calls instead of touching the
/// filesystem.
pub trait UnitRunner: Send + Sync {
    fn run_unit<'a>(&'a self, name: &'a str) -> UnitFuture<'a>;
}
