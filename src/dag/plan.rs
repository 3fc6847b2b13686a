// src/dag/plan.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::graph::DagGraph;
use crate::errors::{AssetdagError, Result};

/// Ordered groups of units. Units inside a group may run concurrently; a
/// group starts only after the previous one finished successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    groups: Vec<BTreeSet<String>>,
}

impl ExecutionPlan {
    /// Build a plan from explicit groups.
    ///
    /// Every unit must exist and appear once, and every dependency that is
    /// part of the plan must sit in an earlier group. Dependencies outside
    /// the plan are assumed to be satisfied already. Empty groups are dropped.
    pub fn compose<G, U>(graph: &DagGraph, groups: G) -> Result<Self>
    where
        G: IntoIterator<Item = U>,
        U: IntoIterator<Item = String>,
    {
        let groups: Vec<BTreeSet<String>> = groups
            .into_iter()
            .map(|g| g.into_iter().collect::<BTreeSet<_>>())
            .filter(|g| !g.is_empty())
            .collect();

        let mut position: BTreeMap<&str, usize> = BTreeMap::new();
        for (idx, group) in groups.iter().enumerate() {
            for unit in group {
                if !graph.contains(unit) {
                    return Err(AssetdagError::UnitNotFound(unit.clone()));
                }
                if position.insert(unit.as_str(), idx).is_some() {
                    return Err(AssetdagError::ConfigError(format!(
                        "unit '{unit}' appears in more than one plan group"
                    )));
                }
            }
        }

        for (unit, idx) in &position {
            for dep in graph.dependencies_of(unit) {
                if let Some(dep_idx) = position.get(dep.as_str()) {
                    if dep_idx >= idx {
                        return Err(AssetdagError::ConfigError(format!(
                            "unit '{unit}' is planned in group {} but its dependency '{dep}' is in group {}",
                            idx + 1,
                            dep_idx + 1
                        )));
                    }
                }
            }
        }

        Ok(Self { groups })
    }

    /// Every unit of the graph, grouped by dependency depth.
    pub fn layered(graph: &DagGraph) -> Result<Self> {
        let all: Vec<String> = graph.tasks().map(str::to_string).collect();
        Self::for_units(graph, &all)
    }

    /// Only the named units, grouped by dependency depth among themselves.
    ///
    /// A unit's group index is the length of the longest dependency chain
    /// leading to it, so independent units share group 0.
    pub fn for_units(graph: &DagGraph, names: &[String]) -> Result<Self> {
        let selected: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        if let Some(missing) = selected.iter().find(|n| !graph.contains(n)) {
            return Err(AssetdagError::UnitNotFound(missing.to_string()));
        }

        let mut dag: DiGraphMap<&str, ()> = DiGraphMap::new();
        for &name in &selected {
            dag.add_node(name);
            for dep in graph.dependencies_of(name) {
                if selected.contains(dep.as_str()) {
                    dag.add_edge(dep.as_str(), name, ());
                }
            }
        }

        let order = toposort(&dag, None).map_err(|cycle| {
            AssetdagError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                cycle.node_id()
            ))
        })?;

        let mut depth: BTreeMap<&str, usize> = BTreeMap::new();
        for node in order {
            let d = dag
                .neighbors_directed(node, petgraph::Direction::Incoming)
                .filter_map(|dep| depth.get(dep).map(|d| d + 1))
                .max()
                .unwrap_or(0);
            depth.insert(node, d);
        }

        let layers = depth.values().copied().max().map_or(0, |m| m + 1);
        let mut groups = vec![BTreeSet::new(); layers];
        for (name, d) in depth {
            groups[d].insert(name.to_string());
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[BTreeSet<String>] {
        &self.groups
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flatten().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Index of the group containing `unit`.
    pub fn group_of(&self, unit: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.contains(unit))
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, group) in self.groups.iter().enumerate() {
            let names: Vec<&str> = group.iter().map(String::as_str).collect();
            writeln!(f, "group {}: {}", idx + 1, names.join(", "))?;
        }
        Ok(())
    }
}
