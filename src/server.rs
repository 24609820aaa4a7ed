//! HTTP server and per-request orchestration.
//!
//! Every request follows the same path: log, apply the configured delay,
//! resolve the request path to a file, serve from cache or fall back to
//! disk, optionally render the template, respond. Unresolvable requests
//! get a 404 with the literal body `404`; internal errors never reach the
//! client.

use crate::cache::ResponseCache;
use crate::config::{RoutingMode, ServerConfig};
use crate::resolver::{self, RouteTable};
use crate::sniff;
use crate::store::{FileStore, StoreError};
use crate::template::TemplateEngine;
use crate::watcher::spawn_watcher;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::borrow::Cow;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared per-request state: configuration plus the injected cache, file
/// store, optional route table, and template engine.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    cache: ResponseCache,
    store: FileStore,
    routes: Option<Arc<RouteTable>>,
    templates: Arc<TemplateEngine>,
}

impl AppState {
    /// Build the state for a validated configuration. In enumerated mode
    /// this walks the data root once; the resulting route table is
    /// immutable for the process lifetime.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let routes = match config.routing {
            RoutingMode::Enumerated => {
                let table = RouteTable::build(&config.data_dir)?;
                info!(routes = table.len(), "enumerated data directory");
                Some(Arc::new(table))
            }
            RoutingMode::Direct => None,
        };

        Ok(Self {
            config: Arc::new(config),
            cache: ResponseCache::new(),
            store: FileStore::new(),
            routes,
            templates: Arc::new(TemplateEngine::new()),
        })
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

/// Build the router: one fallback handler covers any method and any path.
pub fn router(state: AppState) -> Router {
    Router::new().fallback(serve_mock).with_state(state)
}

/// Run the server until ctrl-c.
///
/// The watch subscription is established before the listener: the server
/// must not serve without cache coherency, so a subscription failure is
/// fatal here.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    let watcher = spawn_watcher(&state.config.data_dir, state.cache.clone())?;

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, data_dir = %state.config.data_dir.display(), "mock server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    watcher.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested");
}

async fn serve_mock(
    State(state): State<AppState>,
    method: Method,
    version: Version,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    log_request(&state.config, &method, version, &uri, &headers, &body);

    // Per-request suspension only; no shared lock is held across this.
    let delay_ms = state.config.delay.calculate();
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    let file_path = match resolve(&state, uri.path()) {
        Some(path) => path,
        None => return not_found(),
    };

    let data = match state.cache.get(&file_path) {
        Some(cached) => cached,
        None => match state.store.read(&file_path).await {
            Ok(data) => state.cache.put(file_path, data),
            Err(StoreError::NotFound(path)) => {
                debug!(path = %path.display(), "no response file");
                return not_found();
            }
            Err(err) => {
                warn!(error = %err, "response file unreadable");
                return not_found();
            }
        },
    };

    // In template mode the cache holds the template source; rendering runs
    // per request against that request's own body.
    let data = if state.config.template {
        state
            .templates
            .render(&data, &body)
            .map(Bytes::from)
            .unwrap_or(data)
    } else {
        data
    };

    let content_type = sniff::detect(&data);
    ([(header::CONTENT_TYPE, content_type)], data).into_response()
}

fn resolve(state: &AppState, url_path: &str) -> Option<PathBuf> {
    match &state.routes {
        Some(table) => table.lookup(url_path).map(PathBuf::from),
        None => resolver::resolve_direct(&state.config.data_dir, url_path),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404").into_response()
}

fn log_request(
    config: &ServerConfig,
    method: &Method,
    version: Version,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) {
    let raw = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let shown: Cow<'_, str> = if config.unescape_request_query {
        urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
    } else {
        Cow::Borrowed(raw)
    };
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    info!(method = %method, path = %shown, version = ?version, user_agent, "request");

    if body.is_empty() {
        return;
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(json) => {
            let pretty = serde_json::to_string_pretty(&json).unwrap_or_default();
            info!(body = %pretty, "request body");
        }
        Err(_) => info!(body = %String::from_utf8_lossy(body), "request body"),
    }
}
