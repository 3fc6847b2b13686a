// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::defaults::builtin_config;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::types::CssPolicy;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// Relative `source_root` / `output_root` values are anchored at the
/// directory containing the file, so `assetdag --config site/Assetdag.toml`
/// behaves the same from any working directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;

    let base_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(config.with_base_dir(base_dir))
}

/// Resolve the configuration used for a CLI invocation.
///
/// - An explicit path must exist.
/// - Otherwise [`default_config_path`] is used when present.
/// - Otherwise the built-in pipeline is validated with the given css policy.
pub fn load_or_builtin(explicit: Option<&Path>, css: Option<CssPolicy>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        info!(path = %path.display(), "loading config");
        return load_and_validate(path);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        info!(path = %default_path.display(), "loading config");
        return load_and_validate(&default_path);
    }

    let policy = css.unwrap_or_default();
    debug!(?policy, "no config file found, using built-in pipeline");
    ConfigFile::try_from(builtin_config(policy))
}

/// Default config file name, looked up in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Assetdag.toml")
}
