//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, limits and timeouts
//! - Check backend-specific requirements (data directory)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LinkConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{BackendKind, IdStrategy, LinkConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &LinkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    let storage = &config.storage;
    if storage.backend == BackendKind::Embedded && storage.path.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "storage.path",
            "embedded backend needs a data directory",
        ));
    }
    if storage.id_strategy == IdStrategy::Batched && storage.id_batch_size == 0 {
        errors.push(ValidationError::new("storage.id_batch_size", "must be positive"));
    }

    let api = &config.api;
    if api.max_limit == 0 {
        errors.push(ValidationError::new("api.max_limit", "must be positive"));
    }
    if api.default_limit == 0 || api.default_limit > api.max_limit {
        errors.push(ValidationError::new(
            "api.default_limit",
            format!("must be between 1 and max_limit ({})", api.max_limit),
        ));
    }
    if api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be positive"));
    }
    if api.scan_timeout_secs == 0 {
        errors.push(ValidationError::new("api.scan_timeout_secs", "must be positive"));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&LinkConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = LinkConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.storage.path = PathBuf::new();
        config.storage.id_batch_size = 0;
        config.api.default_limit = 20_000;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "storage.path",
                "storage.id_batch_size",
                "api.default_limit"
            ]
        );
    }

    #[test]
    fn test_memory_backend_needs_no_path() {
        let mut config = LinkConfig::default();
        config.storage.backend = BackendKind::Memory;
        config.storage.path = PathBuf::new();
        assert!(validate_config(&config).is_ok());
    }
}
