// tests/reload_events.rs

mod common;
use crate::common::{Site, init_tracing};

use std::sync::Arc;

use tokio::sync::mpsc;

use assetdag::pipeline::Pipeline;
use assetdag::server::{ReloadEvent, ReloadKind};
use assetdag::types::ReloadMode;
use assetdag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

/// `styles` injects plain stylesheets, `theme` injects a mixed folder and
/// `fonts` never notifies.
fn pipeline(site: &Site) -> (Pipeline, mpsc::Receiver<ReloadEvent>) {
    let cfg = ConfigFileBuilder::new()
        .roots(site.src(), site.dist())
        .with_path("css", &["css/*.css"], "css")
        .with_path("theme", &["theme/*"], "theme")
        .with_path("fonts", &["fonts/*"], "fonts")
        .with_task(
            "styles",
            TaskConfigBuilder::new("css").reload(ReloadMode::Inject).build(),
        )
        .with_task(
            "theme",
            TaskConfigBuilder::new("theme").reload(ReloadMode::Inject).build(),
        )
        .with_task("fonts", TaskConfigBuilder::new("fonts").build())
        .build();

    let (tx, rx) = mpsc::channel(8);
    let pipeline = Pipeline::new(Arc::new(cfg))
        .unwrap()
        .with_reload_channel(tx);
    (pipeline, rx)
}

#[tokio::test]
async fn stylesheet_only_changes_are_injected() {
    init_tracing();
    let site = Site::new();
    site.write("css/a.css", ".a{}");
    site.write("css/b.css", ".b{}");
    let (pipeline, mut rx) = pipeline(&site);

    pipeline.run("styles").await.unwrap();
    let event = rx.try_recv().unwrap();
    assert_eq!(event.unit, "styles");
    assert_eq!(event.kind, ReloadKind::Inject);
    assert_eq!(event.paths, vec!["css/a.css", "css/b.css"]);
}

#[tokio::test]
async fn non_stylesheet_output_forces_a_full_reload() {
    init_tracing();
    let site = Site::new();
    site.write("theme/dark.css", ".dark{}");
    site.write("theme/dark.css.map", "{}");
    let (pipeline, mut rx) = pipeline(&site);

    pipeline.run("theme").await.unwrap();
    let event = rx.try_recv().unwrap();
    assert_eq!(event.kind, ReloadKind::Full);
    assert_eq!(event.paths.len(), 2);
}

#[tokio::test]
async fn unchanged_rerun_publishes_nothing() {
    init_tracing();
    let site = Site::new();
    site.write("css/a.css", ".a{}");
    let (pipeline, mut rx) = pipeline(&site);

    pipeline.run("styles").await.unwrap();
    assert!(rx.try_recv().is_ok());

    let manifest = pipeline.run("styles").await.unwrap();
    assert!(!manifest.any_changed());
    assert!(rx.try_recv().is_err());

    site.write("css/a.css", ".a{color:red}");
    pipeline.run("styles").await.unwrap();
    assert_eq!(rx.try_recv().unwrap().paths, vec!["css/a.css"]);
}

#[tokio::test]
async fn units_without_reload_publish_nothing() {
    init_tracing();
    let site = Site::new();
    site.write("fonts/body.woff2", "font");
    let (pipeline, mut rx) = pipeline(&site);

    let manifest = pipeline.run("fonts").await.unwrap();
    assert!(manifest.any_changed());
    assert!(site.has_output("fonts/body.woff2"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn full_reload_channel_does_not_stall_a_run() {
    init_tracing();
    let site = Site::new();
    site.write("css/a.css", ".a{}");
    let cfg = ConfigFileBuilder::new()
        .roots(site.src(), site.dist())
        .with_path("css", &["css/*.css"], "css")
        .with_task(
            "styles",
            TaskConfigBuilder::new("css").reload(ReloadMode::Full).build(),
        )
        .build();
    let (tx, mut rx) = mpsc::channel(1);
    let pipeline = Pipeline::new(Arc::new(cfg))
        .unwrap()
        .with_reload_channel(tx);

    pipeline.run("styles").await.unwrap();
    site.write("css/a.css", ".a{color:red}");
    common::with_timeout(pipeline.run("styles")).await.unwrap();

    assert_eq!(rx.try_recv().unwrap().kind, ReloadKind::Full);
    assert!(rx.try_recv().is_err());
}
