//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;

use linkstore::config::{BackendKind, IdStrategy, LinkConfig, StorageConfig};
use linkstore::http::ApiServer;
use linkstore::lifecycle::Shutdown;
use linkstore::store::{open_store, Route, RouteStore};

/// Every backend and id strategy combination worth exercising.
pub const STRATEGIES: &[(BackendKind, IdStrategy)] = &[
    (BackendKind::Embedded, IdStrategy::Batched),
    (BackendKind::Embedded, IdStrategy::PerCall),
    (BackendKind::Embedded, IdStrategy::Transactional),
    (BackendKind::Memory, IdStrategy::Batched),
];

pub fn storage_config(dir: &Path, backend: BackendKind, id_strategy: IdStrategy) -> StorageConfig {
    StorageConfig {
        backend,
        path: dir.to_path_buf(),
        id_strategy,
        id_batch_size: 100,
    }
}

/// A store in a fresh temp directory. Keep the `TempDir` alive while in use.
pub fn temp_store(backend: BackendKind, id_strategy: IdStrategy) -> (TempDir, Arc<dyn RouteStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&storage_config(dir.path(), backend, id_strategy)).unwrap();
    (dir, store)
}

pub fn route(pattern: &str, url: &str) -> Route {
    Route::new(pattern, url, 1_700_000_000).unwrap()
}

pub fn put_all(store: &dyn RouteStore, routes: &[(&str, &str)]) {
    for (pattern, url) in routes {
        store.put(&route(pattern, url)).unwrap();
    }
}

/// Sources of a sequence of routes, in order.
pub fn sources<'a>(routes: impl IntoIterator<Item = &'a Route>) -> Vec<String> {
    routes.into_iter().map(|r| r.source().to_string()).collect()
}

/// A running API server on an ephemeral port.
pub struct TestServer {
    pub base: String,
    pub store: Arc<dyn RouteStore>,
    shutdown: Shutdown,
    _dir: TempDir,
}

impl TestServer {
    pub async fn start(mut config: LinkConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        config.storage.path = dir.path().to_path_buf();
        let store = open_store(&config.storage).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = ApiServer::new(config, store.clone());
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, rx).await;
        });

        Self {
            base: format!("http://{}", addr),
            store,
            shutdown,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
