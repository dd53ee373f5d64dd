//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener and serve until shutdown
//! - Close the store so allocator state reaches disk
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when the store is open)

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::LinkConfig;
use crate::http::ApiServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::store::open_store;

/// Run the service until a termination signal arrives.
pub async fn run(config: LinkConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = open_store(&config.storage)?;
    tracing::info!(
        backend = ?config.storage.backend,
        path = %config.storage.path.display(),
        id_strategy = ?config.storage.id_strategy,
        "Route store opened"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    let server = ApiServer::new(config, store.clone());
    let served = server.run(listener, shutdown.subscribe()).await;

    let closed = store.close();
    if let Err(e) = &closed {
        tracing::error!(error = %e, "Failed to close route store");
    }
    served?;
    closed?;

    tracing::info!("Shutdown complete");
    Ok(())
}
