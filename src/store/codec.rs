//! Binary encoding of routes into the ordered keyspace.
//!
//! # Layout
//! ```text
//! key:   [tag 'r'][pattern source bytes ...]
//! value: [version:1][timestamp:8 big-endian][url bytes ...]
//! ```
//!
//! Routes and counters share one table; the first key byte names the
//! collection so a counter key can never be mistaken for a pattern.

use crate::store::error::{StoreError, StoreResult};
use crate::store::route::Route;

/// Format version written into every value.
pub const VERSION: u8 = 0;

/// Key tag of the route collection.
pub const ROUTE_TAG: u8 = b'r';

/// Key tag of the counter collection.
pub const COUNTER_TAG: u8 = b'c';

/// Sentinel appended to a key to bound a scan just past it.
pub const SENTINEL: u8 = 0xff;

/// Version byte plus timestamp.
pub const HEADER_LEN: usize = 9;

/// Storage key for a pattern source string.
pub fn route_key(source: &str) -> Vec<u8> {
    tagged_key(ROUTE_TAG, source)
}

/// Storage key for a named counter.
pub fn counter_key(name: &str) -> Vec<u8> {
    tagged_key(COUNTER_TAG, name)
}

fn tagged_key(tag: u8, s: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(s.len() + 1);
    key.push(tag);
    key.extend_from_slice(s.as_bytes());
    key
}

/// Half-open key range covering every route whose source starts with `prefix`.
///
/// Pattern sources are UTF-8 and never contain `0xff`, so the sentinel is a
/// strict upper bound for every extension of the prefix.
pub fn prefix_range(prefix: &str) -> (Vec<u8>, Vec<u8>) {
    let start = route_key(prefix);
    let mut end = start.clone();
    end.push(SENTINEL);
    (start, end)
}

/// First key of the route collection.
pub fn routes_start() -> Vec<u8> {
    vec![ROUTE_TAG]
}

/// Exclusive upper bound of the route collection.
pub fn routes_end() -> Vec<u8> {
    vec![ROUTE_TAG + 1]
}

/// Encode the value half of a route.
pub fn encode_value(route: &Route) -> Vec<u8> {
    let mut val = Vec::with_capacity(HEADER_LEN + route.url.len());
    val.push(VERSION);
    val.extend_from_slice(&route.time.to_be_bytes());
    val.extend_from_slice(route.url.as_bytes());
    val
}

/// Encode a route into its key and value.
pub fn encode(route: &Route) -> (Vec<u8>, Vec<u8>) {
    (route_key(route.source()), encode_value(route))
}

/// Decode a stored key and value back into a route.
pub fn decode(key: &[u8], val: &[u8]) -> StoreResult<Route> {
    if val.len() < HEADER_LEN {
        return Err(StoreError::CorruptValue(format!(
            "value is {} bytes, header needs {}",
            val.len(),
            HEADER_LEN
        )));
    }

    if val[0] != VERSION {
        return Err(StoreError::CorruptValue(format!(
            "unsupported version {}",
            val[0]
        )));
    }

    let source = match key.split_first() {
        Some((&ROUTE_TAG, rest)) => std::str::from_utf8(rest)
            .map_err(|e| StoreError::InvalidKey(format!("pattern is not utf-8: {}", e)))?,
        Some((tag, _)) => {
            return Err(StoreError::InvalidKey(format!("unexpected key tag {:#04x}", tag)))
        }
        None => return Err(StoreError::InvalidKey("empty key".into())),
    };

    let url = std::str::from_utf8(&val[HEADER_LEN..])
        .map_err(|e| StoreError::CorruptValue(format!("url is not utf-8: {}", e)))?;

    let mut ts = [0u8; 8];
    ts.copy_from_slice(&val[1..HEADER_LEN]);

    Route::new(source, url, u64::from_be_bytes(ts))
        .map_err(|e| StoreError::InvalidKey(e.to_string()))
}
