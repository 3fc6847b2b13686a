#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use assetdag::config::{
    ConfigFile, ConfigSection, PathEntry, RawConfigFile, ServerSection, StepConfig, TaskConfig,
};
use assetdag::errors::Result;
use assetdag::types::{CssPolicy, ReloadMode};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                server: ServerSection::default(),
                paths: BTreeMap::new(),
                task: BTreeMap::new(),
            },
        }
    }

    /// Source and output roots, e.g. `tempdir/src` and `tempdir/dist`.
    pub fn roots(mut self, source: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        self.config.config.source_root = source.as_ref().to_path_buf();
        self.config.config.output_root = output.as_ref().to_path_buf();
        self
    }

    pub fn css(mut self, policy: CssPolicy) -> Self {
        self.config.config.css = policy;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn with_path(mut self, category: &str, source: &[&str], build: &str) -> Self {
        self.config.paths.insert(
            category.to_string(),
            PathEntry {
                source: source.iter().map(|s| s.to_string()).collect(),
                build: build.to_string(),
                watch: None,
                exclude: Vec::new(),
            },
        );
        self
    }

    pub fn with_watch(mut self, category: &str, watch: &[&str]) -> Self {
        if let Some(entry) = self.config.paths.get_mut(category) {
            entry.watch = Some(watch.iter().map(|s| s.to_string()).collect());
        }
        self
    }

    pub fn with_exclude(mut self, category: &str, pattern: &str) -> Self {
        if let Some(entry) = self.config.paths.get_mut(category) {
            entry.exclude.push(pattern.to_string());
        }
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(input: &str) -> Self {
        Self {
            task: TaskConfig {
                input: input.to_string(),
                output: None,
                steps: Vec::new(),
                reload: ReloadMode::None,
                after: Vec::new(),
            },
        }
    }

    pub fn output(mut self, dir: &str) -> Self {
        self.task.output = Some(dir.to_string());
        self
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.task.steps.push(step);
        self
    }

    pub fn reload(mut self, mode: ReloadMode) -> Self {
        self.task.reload = mode;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
