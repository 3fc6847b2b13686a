// src/server/http.rs

//! Static file server for the output root with live reload.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::sse::{Event, KeepAlive};
use axum::response::{IntoResponse, Response, Sse};
use axum::routing::get;
use tokio_stream::{Stream, StreamExt};
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::model::ServerSection;
use crate::server::notifier::ReloadNotifier;

pub const EVENTS_PATH: &str = "/__assetdag/events";
pub const CLIENT_PATH: &str = "/__assetdag/reload.js";

const RELOAD_CLIENT: &str = include_str!("../../assets/reload-client.js");

#[derive(Clone)]
struct ServerState {
    root: Arc<PathBuf>,
    notifier: ReloadNotifier,
}

/// Router serving `root`, the reload client and the SSE event stream.
pub fn router(root: impl Into<PathBuf>, notifier: ReloadNotifier) -> Router {
    let state = ServerState {
        root: Arc::new(root.into()),
        notifier,
    };

    Router::new()
        .route(EVENTS_PATH, get(handle_events))
        .route(CLIENT_PATH, get(handle_client_script))
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the future is dropped.
pub async fn serve(
    settings: &ServerSection,
    root: PathBuf,
    notifier: ReloadNotifier,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("invalid server address {}:{}", settings.host, settings.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(url = %format!("http://{addr}"), root = %root.display(), "dev server listening");
    axum::serve(listener, router(root, notifier))
        .await
        .context("dev server error")?;
    Ok(())
}

async fn handle_events(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.notifier.subscribe();
    debug!(client = subscription.id(), "sse stream opened");

    let stream = subscription.map(|data| Ok(Event::default().data(data)));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_client_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_CLIENT,
    )
}

/// HTML pages get the reload client injected; everything else is handed to
/// `ServeDir`.
async fn handle_request(State(state): State<ServerState>, req: Request) -> Response {
    if req.method() == Method::GET {
        if let Some(page) = html_page_for(&state.root, req.uri().path()) {
            if let Ok(html) = tokio::fs::read_to_string(&page).await {
                return (
                    [
                        (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                        (header::CACHE_CONTROL, "no-cache"),
                    ],
                    inject_client(&html),
                )
                    .into_response();
            }
        }
    }

    match ServeDir::new(state.root.as_ref()).oneshot(req).await {
        Ok(res) => res.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}

/// Map a request path to an existing HTML file under `root`.
fn html_page_for(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let trimmed = uri_path.trim_start_matches('/');
    if trimmed.split('/').any(|seg| seg == ".." || seg.contains('\\')) {
        return None;
    }

    let mut path = root.join(trimmed);
    if trimmed.is_empty() || uri_path.ends_with('/') || path.is_dir() {
        path = path.join("index.html");
    }
    let is_html = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));

    (is_html && path.is_file()).then_some(path)
}

/// Insert the client script before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_PATH}"></script>"#);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => format!("{}{}{}", &html[..idx], tag, &html[idx..]),
        None => format!("{html}{tag}"),
    }
}
