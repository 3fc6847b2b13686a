// tests/plan_execution.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use assetdag::dag::{DagGraph, ExecutionPlan, execute_plan};
use assetdag::errors::AssetdagError;
use assetdag_test_utils::fake_runner::FakeRunner;

fn graph(edges: &[(&str, &[&str])]) -> DagGraph {
    DagGraph::from_edges(
        edges
            .iter()
            .map(|(name, deps)| (name.to_string(), deps.iter().map(|d| d.to_string()).collect())),
    )
}

fn group(units: &[&str]) -> Vec<String> {
    units.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn failing_unit_in_parallel_group_skips_the_next_group() {
    init_tracing();
    let g = graph(&[("a", &[]), ("b", &[]), ("c", &[]), ("d", &["a"])]);
    let plan = ExecutionPlan::compose(&g, vec![group(&["a", "b", "c"]), group(&["d"])]).unwrap();

    let runner = FakeRunner::new()
        .failing("b")
        .delay("a", Duration::from_millis(20));
    let report = with_timeout(execute_plan(&plan, Arc::new(runner.clone()))).await;

    let mut succeeded: Vec<&str> = report.succeeded.iter().map(|m| m.unit.as_str()).collect();
    succeeded.sort();
    assert_eq!(succeeded, vec!["a", "c"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "b");
    assert_eq!(report.skipped, vec!["d"]);
    assert!(!runner.calls().contains(&"d".to_string()));

    let failure = report.into_result().unwrap_err();
    assert_eq!(failure.failed, vec!["b"]);
    assert_eq!(failure.skipped, vec!["d"]);
}

#[tokio::test]
async fn groups_run_in_order() {
    init_tracing();
    let g = graph(&[("styles", &[]), ("scripts", &[]), ("html", &["styles", "scripts"])]);
    let plan = ExecutionPlan::layered(&g).unwrap();
    assert_eq!(plan.group_of("html"), Some(1));

    let runner = FakeRunner::new()
        .delay("styles", Duration::from_millis(30))
        .delay("scripts", Duration::from_millis(10));
    let report = with_timeout(execute_plan(&plan, Arc::new(runner.clone()))).await;
    assert!(report.is_success());

    let calls = runner.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2], "html");
}

#[test]
fn explicit_plan_rejects_dependency_in_same_group() {
    let g = graph(&[("styles", &[]), ("html", &["styles"])]);
    let err = ExecutionPlan::compose(&g, vec![group(&["styles", "html"])]).unwrap_err();
    assert!(matches!(err, AssetdagError::ConfigError(_)));

    let err = ExecutionPlan::compose(&g, vec![group(&["nope"])]).unwrap_err();
    assert!(matches!(err, AssetdagError::UnitNotFound(name) if name == "nope"));
}

#[test]
fn selected_units_ignore_unselected_dependencies() {
    let g = graph(&[("styles", &[]), ("html", &["styles"]), ("fonts", &[])]);
    let plan = ExecutionPlan::for_units(&g, &group(&["html", "fonts"])).unwrap();
    assert_eq!(plan.groups().len(), 1);
    assert_eq!(plan.units().collect::<Vec<_>>(), vec!["fonts", "html"]);
}
