// src/config/mod.rs

//! Configuration loading and validation for assetdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Provide the built-in `src/` -> `dist/` pipeline (`defaults.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate paths, unit ordering and DAG correctness (`validate.rs`).

pub mod defaults;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::builtin_config;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_builtin};
pub use model::{
    ConfigFile, ConfigSection, PathEntry, RawConfigFile, ScssStyle, ServerSection, StepConfig,
    TaskConfig,
};
