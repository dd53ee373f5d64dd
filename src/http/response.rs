//! JSON response shapes and API error mapping.
//!
//! # Responsibilities
//! - Define the wire shapes shared by the server and the admin CLI
//! - Map store errors to HTTP status codes
//!
//! # Design Decisions
//! - Every body carries `ok`; failures add `error`
//! - Client errors (bad cursor, bad pattern) are 400
//! - Internal failures are logged here and reported without detail

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::store::{Route, StoreError};

/// A route as seen over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBody {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_host: Option<String>,
}

impl RouteBody {
    pub fn from_route(route: &Route, source_host: Option<&str>) -> Self {
        Self {
            name: route.source().to_string(),
            url: route.url.clone(),
            time: route.time,
            source_host: source_host.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub ok: bool,
    pub route: RouteBody,
}

/// One page of a listing; also the format of a dump file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutesResponse {
    pub ok: bool,
    #[serde(default)]
    pub routes: Vec<RouteBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

/// Request body of `POST /api/url/...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: String,
    /// Creation time to keep when restoring a dump; now if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound,
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            ApiError::NotFound => write!(f, "not found"),
            ApiError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        metrics::record_store_error(e.kind());
        if e.is_client_error() {
            return ApiError::BadRequest(e.to_string());
        }
        if e.is_corruption() {
            tracing::error!(error = %e, "Route store corruption detected");
        } else {
            tracing::error!(error = %e, "Route store failure");
        }
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };
        (status, Json(ErrorResponse { ok: false, error })).into_response()
    }
}
