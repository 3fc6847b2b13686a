// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module:
//! - compiles each category's watch globs and binds them to the units that
//!   read the category,
//! - wires up a cross-platform filesystem watcher (`notify`),
//! - coalesces bursts of changes into one trigger per unit.
//!
//! It does not know about unit dependencies; it only turns filesystem
//! changes into unit-level triggers for the runtime.

pub mod bindings;
pub mod debounce;
pub mod watcher;

pub use bindings::{WatchBinding, build_bindings, units_for_path};
pub use debounce::{Debouncer, WatchState};
pub use watcher::{WatchSettings, WatcherHandle, spawn_dispatcher, spawn_watcher};
