//! Request inspection and validation.
//!
//! # Responsibilities
//! - Tag every request with an `x-request-id` (UUID v4) and echo it back
//! - Record per-request metrics
//! - Parse listing query parameters
//! - Validate destination URLs before they are stored
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Only a fixed set of URL schemes may be stored
//! - A destination pointing back at this host is rejected as a loop

use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use url::Url;

use crate::http::response::ApiError;
use crate::observability::metrics;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Schemes a stored destination may use.
pub const ALLOWED_SCHEMES: &[&str] = &[
    "http", "https", "mailto", "ftp", "slack", "ssh", "zoommtg", "zoomus",
];

/// Layer that assigns a request ID to requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Request ID of an incoming request, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Middleware recording request count and latency.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

/// Raw query of `GET /api/urls`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub cursor: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "include-generated-names")]
    pub include_generated_names: Option<String>,
}

impl ListQuery {
    /// Page size, defaulting to `default` and capped at `max`.
    pub fn limit(&self, default: usize, max: usize) -> Result<usize, ApiError> {
        let limit = match self.limit.as_deref() {
            None | Some("") => default,
            Some(v) => v
                .parse::<usize>()
                .map_err(|_| ApiError::BadRequest(format!("invalid limit: {}", v)))?,
        };
        if limit == 0 || limit > max {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                max
            )));
        }
        Ok(limit)
    }

    pub fn include_generated(&self) -> Result<bool, ApiError> {
        match self.include_generated_names.as_deref() {
            None | Some("") => Ok(false),
            Some("1" | "true" | "t" | "TRUE" | "True") => Ok(true),
            Some("0" | "false" | "f" | "FALSE" | "False") => Ok(false),
            Some(v) => Err(ApiError::BadRequest(format!(
                "invalid include-generated-names: {}",
                v
            ))),
        }
    }

    pub fn cursor(&self) -> String {
        self.cursor.clone().unwrap_or_default()
    }
}

/// Host header of the request, if any.
pub fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

/// Check that `raw` is a storable destination for a request served on `host`.
pub fn validate_url(host: Option<&str>, raw: &str) -> Result<(), ApiError> {
    let url = Url::parse(raw).map_err(|_| ApiError::BadRequest("invalid URL".to_string()))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        tracing::debug!(scheme = url.scheme(), "Rejected destination scheme");
        return Err(ApiError::BadRequest("invalid URL".to_string()));
    }

    if let (Some(host), Some(target)) = (host, url.host_str()) {
        let authority = match url.port() {
            Some(port) => format!("{}:{}", target, port),
            None => target.to_string(),
        };
        if authority.eq_ignore_ascii_case(host) {
            return Err(ApiError::BadRequest("URL would create a redirect loop".to_string()));
        }
    }

    Ok(())
}
