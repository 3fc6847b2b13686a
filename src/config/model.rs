// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::paths::PathResolver;
use crate::types::{CssPolicy, ReloadMode};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// source_root = "src"
/// output_root = "dist"
/// css = "scss"
///
/// [paths.js]
/// source = ["js/*.js"]
/// build = "js"
/// watch = ["js/**/*.js"]
///
/// [task.scripts]
/// input = "js"
/// reload = "full"
/// steps = [{ kind = "concat", file = "main.min.js" }, { kind = "minify-js" }]
/// ```
///
/// All sections except `[task.*]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub server: ServerSection,

    /// Asset categories keyed by name (`html`, `js`, `css`, ...).
    #[serde(default)]
    pub paths: BTreeMap<String, PathEntry>,

    /// All task units from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated, immutable configuration.
///
/// Built once at startup (see [`crate::config::load_and_validate`]) and shared
/// by reference or `Arc` with every component.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    server: ServerSection,
    task: BTreeMap<String, TaskConfig>,
    resolver: PathResolver,
    base_dir: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        server: ServerSection,
        task: BTreeMap<String, TaskConfig>,
        resolver: PathResolver,
    ) -> Self {
        Self {
            config,
            server,
            task,
            resolver,
            base_dir: PathBuf::from("."),
        }
    }

    /// Anchor relative `source_root` / `output_root` at `dir` (usually the
    /// directory holding the config file).
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn source_root(&self) -> PathBuf {
        self.base_dir.join(&self.config.source_root)
    }

    pub fn output_root(&self) -> PathBuf {
        self.base_dir.join(&self.config.output_root)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Directory holding the authored assets.
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Fully regenerable output directory. Cleaned before every build.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Whether stylesheets are compiled from SCSS or copied prebuilt.
    #[serde(default)]
    pub css: CssPolicy,

    /// Quiet interval for coalescing bursts of file changes, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_source_root() -> PathBuf {
    PathBuf::from("src")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("dist")
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_root: default_output_root(),
            css: CssPolicy::default(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[server]` section for the development server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[paths.<category>]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PathEntry {
    /// Globs selecting the category's inputs, relative to the source root.
    pub source: Vec<String>,

    /// Output directory for the category, relative to the output root.
    pub build: String,

    /// Globs that trigger a rebuild. Defaults to `source`.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Globs removed from both source selection and watching.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaskConfig {
    /// Category (key of `[paths]`) this unit reads.
    pub input: String,

    /// Output directory relative to the output root. Defaults to the input
    /// category's `build` directory.
    #[serde(default)]
    pub output: Option<String>,

    /// Ordered transform steps. An empty list copies the inputs unchanged.
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Notification sent to dev-server clients after a run that changed output.
    #[serde(default)]
    pub reload: ReloadMode,

    /// Units that must complete before this one starts.
    #[serde(default)]
    pub after: Vec<String>,
}

/// One transform step, tagged by `kind`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepConfig {
    /// Expand `@@include('file')` directives.
    Include {
        #[serde(default = "default_include_prefix")]
        prefix: String,
        /// `"@file"` resolves includes next to the including file; anything
        /// else is a directory relative to the source root.
        #[serde(default = "default_include_basepath")]
        basepath: String,
    },

    /// Compile SCSS to CSS.
    Scss {
        #[serde(default)]
        style: ScssStyle,
    },

    /// Minify and vendor-prefix CSS.
    Css {
        #[serde(default = "default_true")]
        minify: bool,
        #[serde(default = "default_css_targets")]
        targets: Vec<String>,
    },

    /// Join every asset into a single file.
    Concat {
        file: String,
        #[serde(default = "default_separator")]
        separator: String,
    },

    /// Minify JavaScript.
    MinifyJs,

    /// Rename the single asset.
    Rename { file: String },

    /// Pipe assets through an external program's stdin/stdout.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        /// Only assets with one of these extensions are piped; others pass
        /// through untouched. Empty means every asset.
        #[serde(default)]
        extensions: Vec<String>,
    },
}

impl StepConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StepConfig::Include { .. } => "include",
            StepConfig::Scss { .. } => "scss",
            StepConfig::Css { .. } => "css",
            StepConfig::Concat { .. } => "concat",
            StepConfig::MinifyJs => "minify-js",
            StepConfig::Rename { .. } => "rename",
            StepConfig::Command { .. } => "command",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScssStyle {
    #[default]
    Compressed,
    Expanded,
}

pub(crate) fn default_include_prefix() -> String {
    "@@".to_string()
}

pub(crate) fn default_include_basepath() -> String {
    "@file".to_string()
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_css_targets() -> Vec<String> {
    vec!["last 10 versions".to_string()]
}

fn default_separator() -> String {
    "\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_deserialize_by_kind() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[paths.js]
source = ["js/*.js"]
build = "js"

[task.scripts]
input = "js"
reload = "full"
steps = [
  { kind = "concat", file = "main.min.js" },
  { kind = "minify-js" },
  { kind = "command", program = "cat" },
]
"#,
        )
        .unwrap();

        let task = &raw.task["scripts"];
        assert_eq!(task.reload, ReloadMode::Full);
        assert_eq!(
            task.steps,
            vec![
                StepConfig::Concat {
                    file: "main.min.js".into(),
                    separator: "\n".into()
                },
                StepConfig::MinifyJs,
                StepConfig::Command {
                    program: "cat".into(),
                    args: vec![],
                    extensions: vec![]
                },
            ]
        );
        assert_eq!(raw.config.output_root, PathBuf::from("dist"));
        assert_eq!(raw.server.port, 3000);
    }

    #[test]
    fn unknown_step_kind_is_rejected() {
        let res: Result<RawConfigFile, _> = toml::from_str(
            r#"
[task.x]
input = "js"
steps = [{ kind = "uglify" }]
"#,
        );
        assert!(res.is_err());
    }
}
