//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the link
//! store. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LinkConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route store backend and identifier allocation.
    pub storage: StorageConfig,

    /// HTTP API limits and timeouts.
    pub api: ApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8067").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8067".to_string(),
        }
    }
}

/// Which store implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Ordered on-disk table (redb) under `storage.path`.
    #[default]
    Embedded,
    /// Volatile ordered map; contents are lost on exit.
    Memory,
}

/// How the embedded backend persists its identifier counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Persist a ceiling every `id_batch_size` ids.
    #[default]
    Batched,
    /// Persist every id before returning it.
    PerCall,
    /// Increment a counter key inside an engine write transaction.
    Transactional,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend implementation.
    pub backend: BackendKind,

    /// Data directory for the embedded backend.
    pub path: PathBuf,

    /// Identifier persistence strategy.
    pub id_strategy: IdStrategy,

    /// Ids reserved per ceiling commit (batched strategy only).
    pub id_batch_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Embedded,
            path: PathBuf::from("data"),
            id_strategy: IdStrategy::Batched,
            id_batch_size: 1000,
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Public host echoed back as `source_host` on route responses.
    pub host: Option<String>,

    /// Page size when a listing does not specify one.
    pub default_limit: usize,

    /// Largest page size a client may request.
    pub max_limit: usize,

    /// Total time allowed per request in seconds.
    pub request_timeout_secs: u64,

    /// Time allowed for one listing scan in seconds.
    pub scan_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: None,
            default_limit: 100,
            max_limit: 10_000,
            request_timeout_secs: 30,
            scan_timeout_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8067");
        assert_eq!(config.storage.backend, BackendKind::Embedded);
        assert_eq!(config.storage.id_strategy, IdStrategy::Batched);
        assert_eq!(config.storage.id_batch_size, 1000);
        assert_eq!(config.api.default_limit, 100);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml() {
        let config: LinkConfig = toml::from_str(
            r#"
            [storage]
            backend = "memory"
            id_strategy = "per_call"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.storage.id_strategy, IdStrategy::PerCall);
        assert_eq!(config.storage.path, PathBuf::from("data"));
        assert_eq!(config.api.max_limit, 10_000);
    }
}
