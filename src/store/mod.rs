//! Route store subsystem.
//!
//! # Data Flow
//! ```text
//! Lookup "a/b/c"
//!     → exact get("a/b/c")
//!     → else uri_prefix → get_for_prefix("a") (range scan over ["ra", "ra\xff"))
//!     → route.rs (expand against each candidate)
//!     → best match: longest literal prefix, then key order
//!
//! Admin listing / backup
//!     → list(cursor, limit)
//!     → cursor.rs (decode start key, "\xff" sentinel = strictly after)
//!     → iter.rs (decode lazily, stop on Done, error or cancellation)
//!
//! Auto-named route
//!     → next_id() → ids subsystem
//! ```
//!
//! # Design Decisions
//! - One trait, several backends, picked at startup by [`open_store`]
//! - Keys are tagged pattern sources, so table order is pattern order
//! - A missing route is `Ok(None)`, never an error
//! - Every backend decodes through the same codec and iterator adapter

pub mod codec;
pub mod cursor;
pub mod embedded;
pub mod error;
pub mod iter;
pub mod memory;
pub mod route;

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};

use crate::config::{BackendKind, StorageConfig};
use crate::ids::encoding::{is_generated, GENERATED_PREFIX};

pub use cursor::{decode_cursor, encode_cursor, RouteCursor};
pub use embedded::EmbeddedStore;
pub use error::{StoreError, StoreResult};
pub use iter::{ScanCancel, StoreIter};
pub use memory::MemoryStore;
pub use route::{uri_prefix, Route};

/// Parameters of a listing scan.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Resume cursor; empty means start of table.
    pub cursor: String,

    /// Maximum number of routes to yield.
    pub limit: Option<usize>,

    /// Checked between iterator steps.
    pub cancel: Option<ScanCancel>,
}

/// Operations every route store backend provides.
pub trait RouteStore: Send + Sync {
    /// Exact lookup by pattern source.
    fn get(&self, pattern: &str) -> StoreResult<Option<Route>>;

    /// Insert or overwrite a route. Durable once this returns `Ok`.
    fn put(&self, route: &Route) -> StoreResult<()>;

    /// Remove a route, reporting whether it existed.
    fn delete(&self, pattern: &str) -> StoreResult<bool>;

    /// Every route whose pattern source starts with `prefix`, ascending.
    fn get_for_prefix(&self, prefix: &str) -> StoreResult<StoreIter<Route>>;

    /// Routes strictly after `opts.cursor`, ascending, each with its own cursor.
    fn list(&self, opts: &ListOptions) -> StoreResult<StoreIter<RouteCursor>>;

    /// Allocate the next identifier for an auto-named route.
    fn next_id(&self) -> StoreResult<u64>;

    /// Persist in-memory state before shutdown.
    fn close(&self) -> StoreResult<()>;
}

/// Key range a listing from `cursor` covers, or `None` if it is empty.
pub(crate) fn scan_bounds(cursor: &str) -> StoreResult<Option<(Vec<u8>, Vec<u8>)>> {
    let start = decode_cursor(cursor)?.unwrap_or_else(codec::routes_start);
    let end = codec::routes_end();
    if start >= end {
        return Ok(None);
    }
    Ok(Some((start, end)))
}

/// Open the backend selected by configuration.
pub fn open_store(config: &StorageConfig) -> StoreResult<Arc<dyn RouteStore>> {
    match config.backend {
        BackendKind::Embedded => Ok(Arc::new(EmbeddedStore::open(config)?)),
        BackendKind::Memory => {
            tracing::warn!("Using in-memory route store; routes are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// A page request for [`list_page`].
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub cursor: String,
    pub limit: usize,
    /// Include auto-named routes (`:` prefixed) in the page.
    pub include_generated: bool,
    pub cancel: Option<ScanCancel>,
}

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub routes: Vec<Route>,
    /// Cursor of the next page, `None` on the last page.
    pub next: Option<String>,
}

/// Cursor that starts a scan just past every generated name.
fn past_generated_cursor() -> String {
    let mut key = codec::route_key("");
    key.push(GENERATED_PREFIX as u8 + 1);
    URL_SAFE.encode(key)
}

/// Collect one page of routes.
///
/// `next` is only set when at least one more eligible route follows the page.
/// A zero limit is rejected.
pub fn list_page(store: &dyn RouteStore, req: PageRequest) -> StoreResult<Page> {
    if req.limit == 0 {
        return Err(StoreError::BadInput("page limit must be at least 1".into()));
    }
    let mut opts = ListOptions {
        cursor: req.cursor,
        limit: None,
        cancel: req.cancel,
    };
    let mut it = store.list(&opts)?;
    let mut page = Page::default();

    loop {
        let Some(entry) = it.next_entry()? else {
            break;
        };

        if !req.include_generated && is_generated(entry.route().source()) {
            // generated names are contiguous; jump over all of them at once
            it.close();
            opts.cursor = past_generated_cursor();
            it = store.list(&opts)?;
            continue;
        }

        if page.routes.len() == req.limit {
            page.next = page.routes.last().map(|r| encode_cursor(r.source()));
            break;
        }

        page.routes.push(entry.into_route());
    }

    it.close();
    Ok(page)
}

/// A lookup resolved to a stored route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub route: Route,
    /// Destination with back-references substituted.
    pub url: String,
}

/// Resolve a lookup uri to its best-matching route.
///
/// An exact pattern hit wins outright. Otherwise every route in the uri's
/// prefix bucket is tried; the match with the longest literal prefix wins,
/// ties going to the first in key order.
pub fn resolve(store: &dyn RouteStore, uri: &str) -> StoreResult<Option<Resolved>> {
    if let Some(route) = store.get(uri)? {
        let url = route.expand(uri).unwrap_or_else(|| route.url.clone());
        return Ok(Some(Resolved { route, url }));
    }

    let mut best: Option<(usize, Resolved)> = None;
    for route in store.get_for_prefix(uri_prefix(uri))? {
        let route = route?;
        let Some(url) = route.expand(uri) else {
            continue;
        };
        let score = route.literal_prefix().len();
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
            best = Some((score, Resolved { route, url }));
        }
    }

    Ok(best.map(|(_, r)| r))
}
