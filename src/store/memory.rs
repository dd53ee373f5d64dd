//! In-memory backend.
//!
//! Same keyspace layout and codec as the embedded backend over a `BTreeMap`,
//! so ordering, prefix scans and cursors behave identically. Scans iterate a
//! snapshot taken when the iterator is created.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ids::allocator::{IdAllocator, MemoryAllocator};
use crate::store::codec;
use crate::store::cursor::RouteCursor;
use crate::store::error::StoreResult;
use crate::store::iter::{RawEntries, StoreIter};
use crate::store::route::Route;
use crate::store::{scan_bounds, ListOptions, RouteStore};

/// Volatile route store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    ids: MemoryAllocator,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn scan(&self, start: Vec<u8>, end: Vec<u8>) -> RawEntries {
        let snapshot: Vec<_> = self
            .read()
            .range(start..end)
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();
        Box::new(snapshot.into_iter())
    }
}

impl RouteStore for MemoryStore {
    fn get(&self, pattern: &str) -> StoreResult<Option<Route>> {
        let key = codec::route_key(pattern);
        match self.read().get(&key) {
            Some(val) => codec::decode(&key, val).map(Some),
            None => Ok(None),
        }
    }

    fn put(&self, route: &Route) -> StoreResult<()> {
        let (key, val) = codec::encode(route);
        self.write().insert(key, val);
        Ok(())
    }

    fn delete(&self, pattern: &str) -> StoreResult<bool> {
        Ok(self.write().remove(&codec::route_key(pattern)).is_some())
    }

    fn get_for_prefix(&self, prefix: &str) -> StoreResult<StoreIter<Route>> {
        let (start, end) = codec::prefix_range(prefix);
        Ok(StoreIter::new(self.scan(start, end), codec::decode))
    }

    fn list(&self, opts: &ListOptions) -> StoreResult<StoreIter<RouteCursor>> {
        let entries: RawEntries = match scan_bounds(&opts.cursor)? {
            Some((start, end)) => self.scan(start, end),
            None => Box::new(std::iter::empty()),
        };
        Ok(StoreIter::new(entries, RouteCursor::decode)
            .with_limit(opts.limit)
            .with_cancel(opts.cancel.clone()))
    }

    fn next_id(&self) -> StoreResult<u64> {
        self.ids.next()
    }

    fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
