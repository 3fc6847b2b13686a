// tests/plan_layering.rs

use std::collections::HashSet;

use proptest::prelude::*;

use assetdag::dag::{DagGraph, ExecutionPlan};

// Acyclic by construction: unit N may only depend on units 0..N-1.
fn dag_strategy(max_units: usize) -> impl Strategy<Value = DagGraph> {
    (1..=max_units).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..n), n).prop_map(
            move |raw| {
                let edges = raw.into_iter().enumerate().map(|(i, picks)| {
                    let deps: HashSet<usize> = if i == 0 {
                        HashSet::new()
                    } else {
                        picks.into_iter().map(|p| p % i).collect()
                    };
                    (
                        format!("unit_{i}"),
                        deps.into_iter().map(|d| format!("unit_{d}")).collect(),
                    )
                });
                DagGraph::from_edges(edges.collect::<Vec<_>>())
            },
        )
    })
}

proptest! {
    #[test]
    fn every_unit_follows_its_dependencies(graph in dag_strategy(12)) {
        let plan = ExecutionPlan::layered(&graph).unwrap();

        let planned: Vec<&str> = plan.units().collect();
        prop_assert_eq!(planned.len(), graph.len());

        for unit in graph.tasks() {
            let idx = plan.group_of(unit).unwrap();
            for dep in graph.dependencies_of(unit) {
                let dep_idx = plan.group_of(dep).unwrap();
                prop_assert!(dep_idx < idx, "{} (group {}) must follow {} (group {})", unit, idx, dep, dep_idx);
            }
        }

        // Layered plans are valid explicit plans too.
        let groups: Vec<Vec<String>> = plan
            .groups()
            .iter()
            .map(|g| g.iter().cloned().collect())
            .collect();
        prop_assert!(ExecutionPlan::compose(&graph, groups).is_ok());
    }
}
