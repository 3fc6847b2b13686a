// src/pipeline/steps/include.rs

//! HTML include directives.
//!
//! With the default `@@` prefix:
//!
//! - `@@include('header.html')`
//! - `@@include("card.html", {"title": "Hello"})`, where `@@title` inside
//!   `card.html` is replaced with `Hello`
//! - `@@header.html`, the bare form of the first line
//!
//! Included files are expanded recursively.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use regex::{Captures, Regex};
use serde_json::Value;

use crate::pipeline::{Asset, StepContext, StepFuture, Transform, blocking};

/// Nesting limit for recursive includes.
pub const MAX_INCLUDE_DEPTH: usize = 10;

/// `basepath` value that resolves includes next to the including file.
pub const BASEPATH_FILE: &str = "@file";
/// `basepath` value that resolves includes from the source root.
pub const BASEPATH_ROOT: &str = "@root";

#[derive(Debug, Clone)]
pub struct IncludeStep {
    directives: Directives,
    basepath: String,
}

impl IncludeStep {
    pub fn new(prefix: &str, basepath: &str) -> anyhow::Result<Self> {
        Ok(Self {
            directives: Directives::compile(prefix)?,
            basepath: basepath.to_string(),
        })
    }
}

impl Transform for IncludeStep {
    fn name(&self) -> &'static str {
        "include"
    }

    fn apply<'a>(&'a self, ctx: &'a StepContext, assets: Vec<Asset>) -> StepFuture<'a> {
        let directives = self.directives.clone();
        let basepath = self.basepath.clone();
        let source_root = ctx.source_root.clone();

        Box::pin(blocking(move || {
            let expander = Expander {
                directives: &directives,
                basepath: &basepath,
                source_root: &source_root,
            };
            assets
                .into_iter()
                .map(|mut asset| -> anyhow::Result<Asset> {
                    let text = asset.text()?.to_string();
                    let mut stack = asset.source.iter().cloned().collect();
                    let expanded = expander
                        .expand(&text, asset.source.as_deref(), &HashMap::new(), &mut stack)
                        .with_context(|| format!("expanding includes in {}", asset.path))?;
                    asset.contents = expanded.into_bytes();
                    Ok(asset)
                })
                .collect()
        }))
    }
}

#[derive(Debug, Clone)]
struct Directives {
    /// Groups: 1 = call target, 2 = JSON context, 3 = bare target.
    include: Regex,
    variable: Regex,
}

impl Directives {
    fn compile(prefix: &str) -> anyhow::Result<Self> {
        let p = regex::escape(prefix);
        Ok(Self {
            include: Regex::new(&format!(
                r#"(?s){p}include\(\s*['"]([^'"]+)['"]\s*(?:,\s*(\{{.*?\}}))?\s*\)|{p}([A-Za-z0-9_\-./]+\.[A-Za-z0-9]+)"#
            ))?,
            variable: Regex::new(&format!(r"{p}([A-Za-z_][A-Za-z0-9_]*)"))?,
        })
    }
}

struct Expander<'a> {
    directives: &'a Directives,
    basepath: &'a str,
    source_root: &'a Path,
}

impl Expander<'_> {
    fn expand(
        &self,
        text: &str,
        current: Option<&Path>,
        vars: &HashMap<String, String>,
        stack: &mut Vec<PathBuf>,
    ) -> anyhow::Result<String> {
        if stack.len() > MAX_INCLUDE_DEPTH {
            bail!("includes nested deeper than {MAX_INCLUDE_DEPTH} levels");
        }

        let text = self.substitute(text, vars);
        self.replace_all(&self.directives.include, &text, |caps| {
            if let Some(bare) = caps.get(3) {
                return self.include(bare.as_str(), current, &HashMap::new(), stack);
            }
            let target = &caps[1];
            let nested_vars = match caps.get(2) {
                Some(json) => parse_context(json.as_str())
                    .with_context(|| format!("invalid context for include '{target}'"))?,
                None => HashMap::new(),
            };
            self.include(target, current, &nested_vars, stack)
        })
    }

    fn include(
        &self,
        target: &str,
        current: Option<&Path>,
        vars: &HashMap<String, String>,
        stack: &mut Vec<PathBuf>,
    ) -> anyhow::Result<String> {
        let path = self.resolve(target, current);
        if stack.contains(&path) {
            bail!("include cycle through {}", path.display());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading include '{target}' ({})", path.display()))?;

        stack.push(path.clone());
        let expanded = self.expand(&contents, Some(&path), vars, stack);
        stack.pop();
        expanded
    }

    fn resolve(&self, target: &str, current: Option<&Path>) -> PathBuf {
        let base = match (self.basepath, current.and_then(Path::parent)) {
            (BASEPATH_FILE, Some(dir)) => dir.to_path_buf(),
            (BASEPATH_FILE | BASEPATH_ROOT, _) => self.source_root.to_path_buf(),
            (dir, _) => self.source_root.join(dir),
        };
        base.join(target.trim_start_matches('/'))
    }

    /// Replace `@@name` for every key in `vars`; unknown names are left as-is.
    fn substitute(&self, text: &str, vars: &HashMap<String, String>) -> String {
        if vars.is_empty() {
            return text.to_string();
        }
        self.directives
            .variable
            .replace_all(text, |caps: &Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    fn replace_all<F>(&self, re: &Regex, text: &str, mut f: F) -> anyhow::Result<String>
    where
        F: FnMut(&Captures<'_>) -> anyhow::Result<String>,
    {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in re.captures_iter(text) {
            let whole = caps.get(0).ok_or_else(|| anyhow!("empty regex match"))?;
            out.push_str(&text[last..whole.start()]);
            out.push_str(&f(&caps)?);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}

fn parse_context(json: &str) -> anyhow::Result<HashMap<String, String>> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(map) = value else {
        bail!("include context must be a JSON object");
    };
    Ok(map
        .into_iter()
        .map(|(k, v)| {
            let s = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, s)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(root: &Path) -> StepContext {
        StepContext {
            unit: "html".into(),
            source_root: root.to_path_buf(),
        }
    }

    async fn run(root: &Path, file: &str, basepath: &str) -> anyhow::Result<String> {
        let path = root.join(file);
        let asset = Asset::new(file, fs::read(&path)?).with_source(path);
        let step = IncludeStep::new("@@", basepath)?;
        let out = step.apply(&ctx(root), vec![asset]).await?;
        Ok(String::from_utf8(out[0].contents.clone())?)
    }

    #[tokio::test]
    async fn expands_call_bare_and_context_forms() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("parts")).unwrap();
        fs::write(root.join("header.html"), "<header>hi</header>").unwrap();
        fs::write(root.join("parts/card.html"), "<h2>@@title</h2>@@missing").unwrap();
        fs::write(
            root.join("index.html"),
            r#"@@header.html|@@include('parts/card.html', {"title": "Cards"})"#,
        )
        .unwrap();

        let out = run(root, "index.html", BASEPATH_FILE).await.unwrap();
        assert_eq!(out, "<header>hi</header>|<h2>Cards</h2>@@missing");
    }

    #[tokio::test]
    async fn nested_includes_resolve_next_to_the_including_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("parts")).unwrap();
        fs::write(root.join("parts/a.html"), "A[@@include('b.html')]").unwrap();
        fs::write(root.join("parts/b.html"), "B").unwrap();
        fs::write(root.join("index.html"), "@@include('parts/a.html')").unwrap();

        assert_eq!(run(root, "index.html", BASEPATH_FILE).await.unwrap(), "A[B]");
    }

    #[tokio::test]
    async fn cycles_and_missing_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.html"), "@@include('b.html')").unwrap();
        fs::write(root.join("b.html"), "@@include('a.html')").unwrap();
        fs::write(root.join("c.html"), "@@include('nope.html')").unwrap();

        let err = run(root, "a.html", BASEPATH_FILE).await.unwrap_err();
        assert!(format!("{err:#}").contains("cycle"));
        assert!(run(root, "c.html", BASEPATH_FILE).await.is_err());
    }

    #[tokio::test]
    async fn fixed_basepath_is_relative_to_source_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("partials")).unwrap();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("partials/nav.html"), "<nav/>").unwrap();
        fs::write(root.join("pages/about.html"), "@@include('nav.html')").unwrap();

        assert_eq!(run(root, "pages/about.html", "partials").await.unwrap(), "<nav/>");
    }
}
