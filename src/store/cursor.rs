//! Pagination cursors.
//!
//! A cursor is the route key followed by the `0xff` sentinel, encoded with the
//! URL-safe base64 alphabet and `=` padding. Scanning from the decoded bytes
//! with an inclusive-start range begins strictly after the route the cursor
//! was taken from.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde::Serialize;

use crate::store::codec::{self, ROUTE_TAG, SENTINEL};
use crate::store::error::{StoreError, StoreResult};
use crate::store::route::Route;

/// Encode a resume cursor positioned just after `source`.
pub fn encode_cursor(source: &str) -> String {
    let mut key = codec::route_key(source);
    key.push(SENTINEL);
    URL_SAFE.encode(key)
}

/// Decode a cursor into the key a scan should start from.
///
/// An empty cursor means the start of the table and decodes to `None`.
pub fn decode_cursor(cursor: &str) -> StoreResult<Option<Vec<u8>>> {
    if cursor.is_empty() {
        return Ok(None);
    }

    let key = URL_SAFE
        .decode(cursor)
        .map_err(|e| StoreError::BadCursor(e.to_string()))?;

    if key.first() != Some(&ROUTE_TAG) {
        return Err(StoreError::BadCursor("cursor does not address a route".into()));
    }

    Ok(Some(key))
}

/// A listed route together with the cursor that resumes after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCursor {
    route: Route,
}

impl RouteCursor {
    pub fn new(route: Route) -> Self {
        Self { route }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn into_route(self) -> Route {
        self.route
    }

    /// Cursor for resuming the listing strictly after this route.
    pub fn cursor(&self) -> String {
        encode_cursor(self.route.source())
    }

    /// Decode function used by listing iterators.
    pub(crate) fn decode(key: &[u8], val: &[u8]) -> StoreResult<Self> {
        codec::decode(key, val).map(Self::new)
    }
}
