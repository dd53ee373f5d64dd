//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Bind server to listener and stop on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ApiConfig, LinkConfig};
use crate::http::handlers;
use crate::http::request;
use crate::store::RouteStore;

/// Largest accepted request body; a route is a name and a URL.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RouteStore>,
    pub api: ApiConfig,
}

/// HTTP server for the link API and redirects.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    pub fn new(config: LinkConfig, store: Arc<dyn RouteStore>) -> Self {
        let state = AppState {
            store,
            api: config.api,
        };
        Self {
            router: build_router(state),
        }
    }

    /// Run until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.api.request_timeout_secs);

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/url/", post(handlers::create_generated))
        .route(
            "/api/url/{*name}",
            get(handlers::get_url)
                .post(handlers::put_url)
                .delete(handlers::delete_url),
        )
        .route("/api/urls", get(handlers::list_urls))
        .route("/api/urls/", get(handlers::list_urls))
        .fallback(handlers::redirect)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(request::set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(request::propagate_request_id_layer())
                .layer(TimeoutLayer::new(timeout))
                .layer(middleware::from_fn(request::track_metrics)),
        )
}
