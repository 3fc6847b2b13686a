// src/dag/graph.rs

use std::collections::BTreeMap;

use crate::config::model::ConfigFile;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Units listed in this unit's `after`.
    deps: Vec<String>,
    /// Units that list this one in their `after`.
    dependents: Vec<String>,
}

/// In-memory DAG of task units keyed by name.
///
/// Acyclicity is validated in `config::validate`; here we only keep
/// adjacency information for planning and watch-mode propagation.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: BTreeMap<String, DagNode>,
}

impl DagGraph {
    /// Build a DAG from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::from_edges(
            cfg.tasks()
                .iter()
                .map(|(name, task)| (name.clone(), task.after.clone())),
        )
    }

    /// Build from `(unit, after)` pairs. Dependencies that are not themselves
    /// listed are ignored.
    pub fn from_edges<I>(units: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut nodes: BTreeMap<String, DagNode> = units
            .into_iter()
            .map(|(name, deps)| {
                (
                    name,
                    DagNode {
                        deps,
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        let known: Vec<String> = nodes.keys().cloned().collect();
        for name in &known {
            if let Some(node) = nodes.get_mut(name) {
                node.deps.retain(|d| known.contains(d));
            }
        }

        for name in known {
            let deps = nodes.get(&name).map(|n| n.deps.clone()).unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// All unit names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate dependencies of a unit (the units listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a unit (units that list this one in `after`).
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependents_mirror_dependencies() {
        let graph = DagGraph::from_edges(vec![
            ("styles".to_string(), vec![]),
            ("html".to_string(), vec!["styles".to_string(), "ghost".to_string()]),
        ]);
        assert_eq!(graph.dependencies_of("html"), ["styles".to_string()]);
        assert_eq!(graph.dependents_of("styles"), ["html".to_string()]);
        assert!(graph.dependents_of("html").is_empty());
    }
}
