//! In-process servers used by store and route tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::state::AppState;

#[derive(Clone, Default)]
pub struct Upstream {
    fixtures: Arc<HashMap<String, (StatusCode, String)>>,
    hits: Arc<DashMap<String, usize>>,
    delay: Duration,
}

impl Upstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` for an exact path-and-query.
    pub fn with(mut self, path_and_query: &str, status: StatusCode, body: &str) -> Self {
        Arc::make_mut(&mut self.fixtures).insert(path_and_query.to_owned(), (status, body.to_owned()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn hits(&self, path_and_query: &str) -> usize {
        self.hits.get(path_and_query).map(|count| *count).unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.iter().map(|entry| *entry.value()).sum()
    }

    /// Bind on an ephemeral port; returns `http://127.0.0.1:<port>` and the server task.
    pub async fn spawn(&self) -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream listener");
        let addr = listener.local_addr().expect("upstream address");
        let app = Router::new()
            .fallback(serve_fixture)
            .with_state(self.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve upstream");
        });
        (format!("http://{addr}"), handle)
    }
}

async fn serve_fixture(State(upstream): State<Upstream>, uri: Uri) -> Response {
    let key = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| uri.path().to_owned());
    *upstream.hits.entry(key.clone()).or_insert(0) += 1;

    if !upstream.delay.is_zero() {
        tokio::time::sleep(upstream.delay).await;
    }

    match upstream.fixtures.get(&key) {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve the full router on an ephemeral port.
pub async fn spawn_app(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let app = crate::app::build_app(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    (addr, handle)
}

/// Per-test directory under the system temp dir, emptied on creation.
pub fn scratch_dir(test_name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ddrank-{}-{test_name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
