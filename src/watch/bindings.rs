// src/watch/bindings.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::model::ConfigFile;
use crate::engine::TaskName;
use crate::errors::Result;
use crate::paths::PatternMatcher;
use crate::types::PathRole;

/// Compiled watch patterns of one category and the units they trigger.
///
/// Built once when watching starts and never mutated.
#[derive(Clone)]
pub struct WatchBinding {
    category: String,
    matcher: PatternMatcher,
    units: Vec<TaskName>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("category", &self.category)
            .field("base", &self.matcher.base())
            .field("units", &self.units)
            .finish()
    }
}

impl WatchBinding {
    pub fn new(category: impl Into<String>, matcher: PatternMatcher, units: Vec<TaskName>) -> Self {
        Self {
            category: category.into(),
            matcher,
            units,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn units(&self) -> &[TaskName] {
        &self.units
    }

    /// `rel_path` is relative to the source root.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.matches(rel_path)
    }
}

/// One binding per category that some unit reads, bound to all of those
/// units.
pub fn build_bindings(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let mut by_category: BTreeMap<&str, Vec<TaskName>> = BTreeMap::new();
    for (name, task) in cfg.tasks() {
        by_category
            .entry(task.input.as_str())
            .or_default()
            .push(name.clone());
    }

    by_category
        .into_iter()
        .map(|(category, units)| {
            let matcher = cfg.resolver().matcher(category, PathRole::Watch)?;
            Ok(WatchBinding::new(category, matcher, units))
        })
        .collect()
}

/// Units bound to any category whose watch patterns match `rel_path`.
pub fn units_for_path(bindings: &[WatchBinding], rel_path: &str) -> BTreeSet<TaskName> {
    bindings
        .iter()
        .filter(|b| b.matches(rel_path))
        .flat_map(|b| b.units().iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_config;
    use crate::types::CssPolicy;

    #[test]
    fn builtin_bindings_route_changes_to_the_right_units() {
        let cfg = ConfigFile::try_from(builtin_config(CssPolicy::Scss)).unwrap();
        let bindings = build_bindings(&cfg).unwrap();

        let hits = |p: &str| units_for_path(&bindings, p).into_iter().collect::<Vec<_>>();
        assert_eq!(hits("scss/partials/_nav.scss"), vec!["styles"]);
        assert_eq!(hits("partials/header.html"), vec!["html"]);
        assert_eq!(hits("js/lib/util.js"), vec!["scripts"]);
        assert!(hits("js/main.min.js").is_empty());
        assert!(hits("css/style.min.css").is_empty());
    }
}
