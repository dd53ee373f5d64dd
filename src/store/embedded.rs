//! Embedded on-disk backend.
//!
//! # Responsibilities
//! - Keep routes (and the transactional id counter) in one ordered redb table
//! - Make every write durable before it is acknowledged
//! - Expose the engine's ordered range scans as [`StoreIter`]s
//!
//! # Design Decisions
//! - One table, keys tagged by collection (see `codec`)
//! - Writes commit with the engine's default immediate durability (fsync)
//! - Readers never block the single writer; no locking beyond the engine's

use std::fs;
use std::path::PathBuf;

use redb::{Database, ReadableTable, TableDefinition};

use crate::config::{IdStrategy, StorageConfig};
use crate::ids::allocator::{BatchedAllocator, IdAllocator, PerCallAllocator};
use crate::observability::metrics;
use crate::store::codec;
use crate::store::cursor::RouteCursor;
use crate::store::error::{StoreError, StoreResult};
use crate::store::iter::{RawEntries, StoreIter};
use crate::store::route::Route;
use crate::store::{scan_bounds, ListOptions, RouteStore};

/// The single ordered table holding every collection.
const KV: TableDefinition<&[u8], &[u8]> = TableDefinition::new("kv");

/// Database file name inside the data directory.
pub const DB_FILENAME: &str = "routes.redb";

/// Counter used by the transactional id strategy.
const ID_COUNTER: &str = "next_id";

enum Ids {
    /// Counter persisted outside the table (ceiling file).
    File(Box<dyn IdAllocator>),
    /// Counter key incremented inside a write transaction.
    Transactional,
}

/// Route store backed by a redb database file.
pub struct EmbeddedStore {
    db: Database,
    ids: Ids,
    path: PathBuf,
}

impl EmbeddedStore {
    /// Open (creating if needed) the store rooted at `config.path`.
    pub fn open(config: &StorageConfig) -> StoreResult<Self> {
        let dir = config.path.as_path();
        fs::create_dir_all(dir)?;

        let db = Database::create(dir.join(DB_FILENAME))?;

        // Make sure the table exists so readers never see TableDoesNotExist.
        let txn = db.begin_write()?;
        txn.open_table(KV)?;
        txn.commit()?;

        let ids = match config.id_strategy {
            IdStrategy::Batched => Ids::File(Box::new(BatchedAllocator::open(
                dir,
                config.id_batch_size,
            )?)),
            IdStrategy::PerCall => Ids::File(Box::new(PerCallAllocator::open(dir)?)),
            IdStrategy::Transactional => Ids::Transactional,
        };

        tracing::info!(
            path = %dir.display(),
            id_strategy = ?config.id_strategy,
            "Embedded route store opened"
        );

        Ok(Self {
            db,
            ids,
            path: dir.to_path_buf(),
        })
    }

    fn scan(&self, start: &[u8], end: &[u8]) -> StoreResult<RawEntries> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV)?;
        let range = table.range::<&[u8]>(start..end)?;

        Ok(Box::new(range.map(|entry| {
            entry
                .map(|(k, v)| (k.value().to_vec(), v.value().to_vec()))
                .map_err(StoreError::from)
        })))
    }

    fn next_counter(&self) -> StoreResult<u64> {
        let key = codec::counter_key(ID_COUNTER);
        let txn = self.db.begin_write()?;
        let id = {
            let mut table = txn.open_table(KV)?;
            let current = match table.get(key.as_slice())? {
                Some(v) => decode_counter(v.value())?,
                None => 0,
            };
            let id = current
                .checked_add(1)
                .ok_or_else(|| StoreError::Io(std::io::Error::other("identifier space exhausted")))?;
            table.insert(key.as_slice(), id.to_be_bytes().as_slice())?;
            id
        };
        txn.commit()?;
        metrics::record_id_allocated("transactional");
        Ok(id)
    }
}

fn decode_counter(val: &[u8]) -> StoreResult<u64> {
    let raw: [u8; 8] = val
        .try_into()
        .map_err(|_| StoreError::CorruptValue(format!("counter is {} bytes, expected 8", val.len())))?;
    Ok(u64::from_be_bytes(raw))
}

impl RouteStore for EmbeddedStore {
    fn get(&self, pattern: &str) -> StoreResult<Option<Route>> {
        let key = codec::route_key(pattern);
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV)?;
        let route = match table.get(key.as_slice())? {
            Some(val) => Some(codec::decode(&key, val.value())?),
            None => None,
        };
        Ok(route)
    }

    fn put(&self, route: &Route) -> StoreResult<()> {
        let (key, val) = codec::encode(route);
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV)?;
            table.insert(key.as_slice(), val.as_slice())?;
        }
        txn.commit()?;
        tracing::debug!(pattern = %route.source(), "Route stored");
        Ok(())
    }

    fn delete(&self, pattern: &str) -> StoreResult<bool> {
        let key = codec::route_key(pattern);
        let txn = self.db.begin_write()?;
        let existed = {
            let mut table = txn.open_table(KV)?;
            let removed = table.remove(key.as_slice())?;
            removed.is_some()
        };
        txn.commit()?;
        tracing::debug!(pattern = %pattern, existed, "Route deleted");
        Ok(existed)
    }

    fn get_for_prefix(&self, prefix: &str) -> StoreResult<StoreIter<Route>> {
        let (start, end) = codec::prefix_range(prefix);
        Ok(StoreIter::new(self.scan(&start, &end)?, codec::decode))
    }

    fn list(&self, opts: &ListOptions) -> StoreResult<StoreIter<RouteCursor>> {
        let entries: RawEntries = match scan_bounds(&opts.cursor)? {
            Some((start, end)) => self.scan(&start, &end)?,
            None => Box::new(std::iter::empty()),
        };
        Ok(StoreIter::new(entries, RouteCursor::decode)
            .with_limit(opts.limit)
            .with_cancel(opts.cancel.clone()))
    }

    fn next_id(&self) -> StoreResult<u64> {
        match &self.ids {
            Ids::File(alloc) => alloc.next(),
            Ids::Transactional => self.next_counter(),
        }
    }

    fn close(&self) -> StoreResult<()> {
        if let Ids::File(alloc) = &self.ids {
            alloc.flush()?;
        }
        tracing::info!(path = %self.path.display(), "Embedded route store closed");
        Ok(())
    }
}
