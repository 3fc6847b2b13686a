// src/paths/resolver.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::model::PathEntry;
use crate::errors::{AssetdagError, Result};
use crate::paths::normalize::{glob_base, normalize_pattern, relative_str};
use crate::types::PathRole;

/// Patterns for one category and role, normalized, plus their shared base
/// directory (relative to the role's root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPatterns {
    pub base: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone)]
struct CategoryPaths {
    source: ResolvedPatterns,
    watch: ResolvedPatterns,
    build: String,
    exclude: Vec<String>,
}

/// Maps asset categories to their normalized source, build and watch
/// patterns.
///
/// Construction validates every category, so a resolver that exists is
/// consistent: each category has a build directory, and its watch patterns
/// live under the same base directory as its source patterns.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    categories: BTreeMap<String, CategoryPaths>,
}

impl PathResolver {
    pub fn from_entries(entries: &BTreeMap<String, PathEntry>) -> Result<Self> {
        let mut categories = BTreeMap::new();

        for (name, entry) in entries {
            let source = resolve_globs(name, PathRole::Source, &entry.source)?;
            let watch = match &entry.watch {
                Some(list) => resolve_globs(name, PathRole::Watch, list)?,
                None => source.clone(),
            };

            if watch.base != source.base {
                return Err(AssetdagError::ConfigError(format!(
                    "category '{name}': watch patterns are rooted at '{}' but source patterns at '{}'",
                    display_base(&watch.base),
                    display_base(&source.base)
                )));
            }

            let build = normalize_pattern(&entry.build);
            if build.split('/').any(|s| s == "..") {
                return Err(AssetdagError::ConfigError(format!(
                    "category '{name}': build directory '{}' escapes the output root",
                    entry.build
                )));
            }

            categories.insert(
                name.clone(),
                CategoryPaths {
                    source,
                    watch,
                    build,
                    exclude: entry.exclude.iter().map(|p| normalize_pattern(p)).collect(),
                },
            );
        }

        Ok(Self { categories })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Patterns configured for `category` in the given role.
    ///
    /// For [`PathRole::Build`] the single pattern is the output directory.
    pub fn resolve(&self, category: &str, role: PathRole) -> Result<ResolvedPatterns> {
        let cat = self.category(category)?;
        Ok(match role {
            PathRole::Source => cat.source.clone(),
            PathRole::Watch => cat.watch.clone(),
            PathRole::Build => ResolvedPatterns {
                base: cat.build.clone(),
                patterns: vec![cat.build.clone()],
            },
        })
    }

    /// Compile a matcher for the source or watch role of `category`.
    pub fn matcher(&self, category: &str, role: PathRole) -> Result<PatternMatcher> {
        let cat = self.category(category)?;
        let resolved = match role {
            PathRole::Source => &cat.source,
            PathRole::Watch => &cat.watch,
            PathRole::Build => {
                return Err(AssetdagError::ConfigError(format!(
                    "category '{category}': build paths are directories, not match patterns"
                )));
            }
        };

        let include = build_globset(&resolved.patterns)
            .with_context(|| format!("building {role} globset for category {category}"))?;
        let exclude = if cat.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&cat.exclude)
                    .with_context(|| format!("building exclude globset for category {category}"))?,
            )
        };

        Ok(PatternMatcher {
            base: resolved.base.clone(),
            include,
            exclude,
        })
    }

    fn category(&self, category: &str) -> Result<&CategoryPaths> {
        self.categories.get(category).ok_or_else(|| {
            AssetdagError::ConfigError(format!("undeclared path category '{category}'"))
        })
    }
}

/// Compiled include/exclude globs for one category role.
///
/// Paths passed to [`PatternMatcher::matches`] are relative to the source
/// root, with forward slashes (e.g. `"js/app.js"`).
#[derive(Clone)]
pub struct PatternMatcher {
    base: String,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl PatternMatcher {
    /// Literal base directory of the patterns, relative to the source root.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Collect all files under `root` that match, sorted by path so that
    /// downstream steps see a deterministic order.
    pub fn collect_files(&self, root: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let start = root.join(&self.base);
        if !start.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&start).follow_links(true) {
            let entry = entry.with_context(|| format!("walking {:?}", start))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rel) = relative_str(root, entry.path()) {
                if self.matches(&rel) {
                    files.push(entry.into_path());
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

fn resolve_globs(category: &str, role: PathRole, raw: &[String]) -> Result<ResolvedPatterns> {
    if raw.is_empty() {
        return Err(AssetdagError::ConfigError(format!(
            "category '{category}': {role} patterns must not be empty"
        )));
    }

    let patterns: Vec<String> = raw.iter().map(|p| normalize_pattern(p)).collect();
    let base = glob_base(&patterns[0]);

    if let Some(other) = patterns.iter().find(|p| glob_base(p) != base) {
        return Err(AssetdagError::ConfigError(format!(
            "category '{category}': {role} pattern '{other}' is not rooted at '{}' like '{}'",
            display_base(&base),
            patterns[0]
        )));
    }
    if base.split('/').any(|s| s == "..") {
        return Err(AssetdagError::ConfigError(format!(
            "category '{category}': {role} patterns escape the source root"
        )));
    }

    Ok(ResolvedPatterns { base, patterns })
}

/// `*` never crosses a directory separator, so `*.html` only matches files
/// directly in the source root.
fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn display_base(base: &str) -> &str {
    if base.is_empty() { "." } else { base }
}
