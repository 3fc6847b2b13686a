// tests/dev_server.rs

use std::fs;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use assetdag::server::http::{CLIENT_PATH, EVENTS_PATH};
use assetdag::server::{ReloadEvent, ReloadKind, ReloadNotifier, router};

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&body).to_string())
}

#[tokio::test]
async fn html_pages_get_the_reload_client() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html><body>hi</body></html>").unwrap();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("css/style.min.css"), ".a{}").unwrap();
    let app = router(dir.path(), ReloadNotifier::new());

    let (status, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(CLIENT_PATH), "body: {body}");
    assert!(body.ends_with("</body></html>"));

    let (status, body) = get(app.clone(), "/css/style.min.css").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ".a{}");

    let (status, body) = get(app.clone(), CLIENT_PATH).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("EventSource"));

    let (status, _) = get(app, "/missing.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn event_stream_registers_a_client() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = ReloadNotifier::new();
    let app = router(dir.path(), notifier.clone());

    let res = app
        .oneshot(Request::builder().uri(EVENTS_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert_eq!(notifier.client_count(), 1);

    let delivered = notifier
        .notify(&ReloadEvent {
            unit: "styles".into(),
            kind: ReloadKind::Inject,
            paths: vec!["css/style.min.css".into()],
        })
        .await;
    assert_eq!(delivered, 1);
}

#[tokio::test]
async fn closing_the_event_stream_unregisters_the_client() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = ReloadNotifier::new();
    let app = router(dir.path(), notifier.clone());

    for _ in 0..3 {
        let res = app
            .clone()
            .oneshot(Request::builder().uri(EVENTS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(notifier.client_count(), 1);
        drop(res);
        assert_eq!(notifier.client_count(), 0);
    }
}
