//! API and redirect handlers.
//!
//! Store work runs on the blocking pool: backends do synchronous disk IO and
//! their iterators are not `Send`, so a whole scan stays inside one closure.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use percent_encoding::percent_decode_str;

use crate::http::request::{self, ListQuery};
use crate::http::response::{
    ApiError, OkResponse, RouteBody, RouteResponse, RoutesResponse, UrlRequest,
};
use crate::http::server::AppState;
use crate::ids::encoding::{clean_name, decode_id, encode_id, is_generated};
use crate::store::{list_page, resolve, PageRequest, Route, RouteStore, ScanCancel, StoreResult};

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {}", e)))?
        .map_err(ApiError::from)
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// `GET /api/url/{name}`
pub async fn get_url(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RouteResponse>, ApiError> {
    let store = state.store.clone();
    let route = blocking(move || store.get(&name))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(RouteResponse {
        ok: true,
        route: RouteBody::from_route(&route, state.api.host.as_deref()),
    }))
}

/// Name a route is stored under when posted as `raw`.
///
/// A well-formed generated name is kept so a dump restores verbatim; any
/// other leading `:` are stripped.
pub fn posted_name(raw: &str) -> &str {
    if is_generated(raw) && decode_id(raw).is_some() {
        raw
    } else {
        clean_name(raw)
    }
}

/// Allocate a generated name not already in use.
fn fresh_name(store: &dyn RouteStore) -> StoreResult<String> {
    loop {
        let name = encode_id(store.next_id()?);
        if store.get(&name)?.is_none() {
            return Ok(name);
        }
        tracing::debug!(name = %name, "Generated name taken by a restored route");
    }
}

/// `POST /api/url/{name}`
pub async fn put_url(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RouteResponse>, ApiError> {
    let name = posted_name(&name).to_string();
    store_route(state, Some(name), &headers, &body).await
}

/// `POST /api/url/` stores under a freshly allocated name.
pub async fn create_generated(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RouteResponse>, ApiError> {
    store_route(state, None, &headers, &body).await
}

async fn store_route(
    state: AppState,
    name: Option<String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<RouteResponse>, ApiError> {
    let req: UrlRequest = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest("invalid json".to_string()))?;
    request::validate_url(request::request_host(headers), &req.url)?;

    let store = state.store.clone();
    let route = blocking(move || {
        let name = match name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => fresh_name(store.as_ref())?,
        };
        let route = match req.time {
            Some(time) => Route::new(&name, &req.url, time)?,
            None => Route::now(&name, &req.url)?,
        };
        store.put(&route)?;
        Ok(route)
    })
    .await?;

    tracing::info!(
        request_id = %request::request_id(headers),
        name = %route.source(),
        bucket = %route.prefix(),
        url = %route.url,
        "Route stored"
    );

    Ok(Json(RouteResponse {
        ok: true,
        route: RouteBody::from_route(&route, state.api.host.as_deref()),
    }))
}

/// `DELETE /api/url/{name}`
pub async fn delete_url(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let store = state.store.clone();
    let pattern = name.clone();
    if !blocking(move || store.delete(&pattern)).await? {
        return Err(ApiError::NotFound);
    }

    tracing::info!(name = %name, "Route deleted");
    Ok(Json(OkResponse { ok: true }))
}

/// `GET /api/urls`
pub async fn list_urls(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RoutesResponse>, ApiError> {
    let req = PageRequest {
        cursor: query.cursor(),
        limit: query.limit(state.api.default_limit, state.api.max_limit)?,
        include_generated: query.include_generated()?,
        cancel: Some(ScanCancel::with_timeout(Duration::from_secs(
            state.api.scan_timeout_secs,
        ))),
    };

    let store = state.store.clone();
    let page = blocking(move || list_page(store.as_ref(), req)).await?;

    let host = state.api.host.as_deref();
    Ok(Json(RoutesResponse {
        ok: true,
        routes: page
            .routes
            .iter()
            .map(|r| RouteBody::from_route(r, host))
            .collect(),
        next: page.next,
    }))
}

/// Everything else: resolve the path and redirect.
pub async fn redirect(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = match percent_decode_str(uri.path()).decode_utf8() {
        Ok(path) => path,
        Err(_) => {
            return ApiError::BadRequest("path is not valid UTF-8".to_string()).into_response()
        }
    };
    let mut lookup = path.trim_start_matches('/').to_string();
    if lookup.is_empty() {
        return ApiError::NotFound.into_response();
    }
    if let Some(query) = uri.query() {
        lookup.push('?');
        lookup.push_str(query);
    }

    let store = state.store.clone();
    let target = lookup.clone();
    match blocking(move || resolve(store.as_ref(), &target)).await {
        Ok(Some(resolved)) => {
            tracing::debug!(
                lookup = %lookup,
                pattern = %resolved.route.source(),
                url = %resolved.url,
                "Resolved"
            );
            Redirect::temporary(&resolved.url).into_response()
        }
        Ok(None) => ApiError::NotFound.into_response(),
        Err(e) => e.into_response(),
    }
}
