// src/config/validate.rs

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::errors::{AssetdagError, Result};
use crate::paths::normalize::{is_within, normalize_pattern};
use crate::paths::PathResolver;
use crate::types::PathRole;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let resolver = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.config, raw.server, raw.task, resolver,
        ))
    }
}

/// Output directory of a unit relative to the output root: its explicit
/// `output`, or the `build` directory of its input category.
pub fn unit_output_dir(resolver: &PathResolver, task: &TaskConfig) -> Result<String> {
    match &task.output {
        Some(out) => Ok(normalize_pattern(out)),
        None => Ok(resolver.resolve(&task.input, PathRole::Build)?.base),
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<PathResolver> {
    ensure_has_tasks(cfg)?;
    validate_roots(cfg)?;
    let resolver = PathResolver::from_entries(&cfg.paths)?;
    validate_css_policy(cfg, &resolver)?;
    validate_task_inputs(cfg, &resolver)?;
    validate_task_dependencies(cfg)?;
    let graph = validate_dag(cfg)?;
    validate_output_ordering(cfg, &resolver, &graph)?;
    Ok(resolver)
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(AssetdagError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_roots(cfg: &RawConfigFile) -> Result<()> {
    let source = normalize_pattern(&cfg.config.source_root.to_string_lossy());
    let output = normalize_pattern(&cfg.config.output_root.to_string_lossy());

    // The output root is wiped before every build.
    if output.is_empty() {
        return Err(AssetdagError::ConfigError(
            "[config].output_root must be a dedicated directory, not the project root"
                .to_string(),
        ));
    }
    if is_within(&source, &output) {
        return Err(AssetdagError::ConfigError(format!(
            "[config].source_root '{}' lies inside output_root '{}'",
            cfg.config.source_root.display(),
            cfg.config.output_root.display()
        )));
    }
    Ok(())
}

fn validate_css_policy(cfg: &RawConfigFile, resolver: &PathResolver) -> Result<()> {
    if !resolver.contains("css") {
        return Ok(());
    }
    let policy = cfg.config.css;
    let ext = policy.source_extension();
    let source = resolver.resolve("css", PathRole::Source)?;
    if let Some(bad) = source.patterns.iter().find(|p| !p.ends_with(ext)) {
        return Err(AssetdagError::ConfigError(format!(
            "css policy '{policy:?}' expects '{ext}' sources, but [paths.css] selects '{bad}'"
        )));
    }
    Ok(())
}

fn validate_task_inputs(cfg: &RawConfigFile, resolver: &PathResolver) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if !resolver.contains(&task.input) {
            return Err(AssetdagError::ConfigError(format!(
                "task '{}' reads undeclared path category '{}'",
                name, task.input
            )));
        }
        let out = unit_output_dir(resolver, task)?;
        if out.split('/').any(|s| s == "..") {
            return Err(AssetdagError::ConfigError(format!(
                "task '{}' writes to '{}', outside the output root",
                name, out
            )));
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

/// Edge direction: dep -> task. For `[task.B] after = ["A"]` we add A -> B.
fn validate_dag(cfg: &RawConfigFile) -> Result<DiGraphMap<&str, ()>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(graph),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(AssetdagError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                node
            )))
        }
    }
}

/// A unit whose input lies inside another unit's output must run strictly
/// after it. This only happens when the output root is nested in the source
/// root.
fn validate_output_ordering<'a>(
    cfg: &'a RawConfigFile,
    resolver: &PathResolver,
    graph: &DiGraphMap<&'a str, ()>,
) -> Result<()> {
    let source = normalize_pattern(&cfg.config.source_root.to_string_lossy());
    let output = normalize_pattern(&cfg.config.output_root.to_string_lossy());
    if !is_within(&output, &source) {
        return Ok(());
    }
    let output_in_source = output
        .strip_prefix(source.as_str())
        .unwrap_or(&output)
        .trim_start_matches('/');

    for (producer, ptask) in cfg.task.iter() {
        let out = unit_output_dir(resolver, ptask)?;
        let produced = join_rel(output_in_source, &out);

        for (consumer, ctask) in cfg.task.iter() {
            let input_base = resolver.resolve(&ctask.input, PathRole::Source)?.base;
            if !is_within(&input_base, &produced) {
                continue;
            }
            if producer == consumer {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{}' reads its own output directory '{}'",
                    consumer, produced
                )));
            }
            if !has_path_connecting(graph, producer.as_str(), consumer.as_str(), None) {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{}' reads '{}', which task '{}' writes; add \"{}\" to its `after` list",
                    consumer, input_base, producer, producer
                )));
            }
        }
    }
    Ok(())
}

fn join_rel(a: &str, b: &str) -> String {
    normalize_pattern(&format!("{a}/{b}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(src)?;
        ConfigFile::try_from(raw)
    }

    const PATHS: &str = r#"
[paths.js]
source = ["js/*.js"]
build = "js"
"#;

    #[test]
    fn empty_config_is_rejected() {
        let err = parse(PATHS).unwrap_err();
        assert!(matches!(err, AssetdagError::ConfigError(_)));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let src = format!("{PATHS}\n[task.a]\ninput = \"css\"\n");
        let err = parse(&src).unwrap_err();
        assert!(matches!(err, AssetdagError::ConfigError(msg) if msg.contains("css")));
    }

    #[test]
    fn cycles_are_rejected() {
        let src = format!(
            "{PATHS}\n[task.a]\ninput = \"js\"\nafter = [\"b\"]\n\n[task.b]\ninput = \"js\"\nafter = [\"a\"]\n"
        );
        let err = parse(&src).unwrap_err();
        assert!(matches!(err, AssetdagError::DagCycle(_)));
    }

    #[test]
    fn css_policy_must_match_sources() {
        let src = r#"
[config]
css = "prebuilt"

[paths.css]
source = ["scss/*.scss"]
build = "css"

[task.styles]
input = "css"
"#;
        let err = parse(src).unwrap_err();
        assert!(matches!(err, AssetdagError::ConfigError(msg) if msg.contains(".css")));
    }

    #[test]
    fn output_root_must_not_contain_sources() {
        let src = format!(
            "[config]\nsource_root = \"dist/src\"\noutput_root = \"dist\"\n{PATHS}\n[task.a]\ninput = \"js\"\n"
        );
        assert!(parse(&src).is_err());
    }

    #[test]
    fn nested_output_requires_ordering() {
        // Output root nested in the source root: `bundle` reads what
        // `scripts` writes, so it must be ordered after it.
        let base = r#"
[config]
source_root = "site"
output_root = "site/out"

[paths.js]
source = ["js/*.js"]
build = "js"

[paths.built]
source = ["out/js/*.js"]
build = "bundle"

[task.scripts]
input = "js"

[task.bundle]
input = "built"
"#;
        let err = parse(base).unwrap_err();
        assert!(matches!(err, AssetdagError::ConfigError(msg) if msg.contains("after")));

        let ordered = base.replace(
            "[task.bundle]\ninput = \"built\"",
            "[task.bundle]\ninput = \"built\"\nafter = [\"scripts\"]",
        );
        assert!(parse(&ordered).is_ok());
    }
}
