//! Durable identifier allocation.
//!
//! # Responsibilities
//! - Hand out strictly increasing ids for auto-named routes
//! - Survive crashes without ever reusing an id
//!
//! # Design Decisions
//! - One mutex per allocator; allocation is not a hot path
//! - The ceiling file is replaced atomically (write, fsync, rename)
//! - The batched strategy may skip up to `batch - 1` ids after a crash

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::observability::metrics;
use crate::store::error::{StoreError, StoreResult};

/// File name of the identifier ceiling inside the data directory.
pub const CEILING_FILENAME: &str = "id";

/// Default number of ids reserved by one ceiling commit.
pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Source of monotonically increasing identifiers.
pub trait IdAllocator: Send + Sync {
    /// Allocate the next identifier.
    fn next(&self) -> StoreResult<u64>;

    /// Persist any state held only in memory.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Strategy name used in logs and metrics.
    fn strategy(&self) -> &'static str;
}

/// The persisted identifier value: eight little-endian bytes.
#[derive(Debug, Clone)]
pub struct CeilingFile {
    path: PathBuf,
}

impl CeilingFile {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(CEILING_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted value, `None` if it was never written.
    pub fn load(&self) -> StoreResult<Option<u64>> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
            StoreError::CorruptValue(format!(
                "{} holds {} bytes, expected 8",
                self.path.display(),
                bytes.len()
            ))
        })?;

        Ok(Some(u64::from_le_bytes(raw)))
    }

    /// Durably replace the persisted value.
    pub fn commit(&self, value: u64) -> StoreResult<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut f = File::create(&tmp)?;
            f.write_all(&value.to_le_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        sync_parent(&self.path)?;
        metrics::record_ceiling_commit();
        Ok(())
    }
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) => File::open(dir)?.sync_all(),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn exhausted() -> StoreError {
    StoreError::Io(io::Error::other("identifier space exhausted"))
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct Batch {
    /// Last id handed out.
    current: u64,
    /// Highest id covered by the ceiling file.
    ceiling: u64,
}

/// Persists a ceiling every `batch` ids instead of every id.
#[derive(Debug)]
pub struct BatchedAllocator {
    file: CeilingFile,
    batch: u64,
    state: Mutex<Batch>,
}

impl BatchedAllocator {
    /// Open the allocator, resuming above the last persisted ceiling.
    pub fn open(dir: &Path, batch: u64) -> StoreResult<Self> {
        if batch == 0 {
            return Err(StoreError::BadInput("id batch size must be positive".into()));
        }

        let file = CeilingFile::new(dir);
        let ceiling = file.load()?.unwrap_or(0);

        tracing::debug!(ceiling, batch, path = %file.path().display(), "Batched id allocator opened");

        Ok(Self {
            file,
            batch,
            state: Mutex::new(Batch {
                current: ceiling,
                ceiling,
            }),
        })
    }
}

impl IdAllocator for BatchedAllocator {
    fn next(&self) -> StoreResult<u64> {
        let mut state = lock(&self.state);

        if state.current >= state.ceiling {
            let ceiling = state.current.checked_add(self.batch).ok_or_else(exhausted)?;
            self.file.commit(ceiling)?;
            state.ceiling = ceiling;
            tracing::debug!(ceiling, "Id ceiling raised");
        }

        state.current += 1;
        metrics::record_id_allocated(self.strategy());
        Ok(state.current)
    }

    /// Lower the ceiling to the last id handed out, so a clean restart
    /// resumes without a gap.
    fn flush(&self) -> StoreResult<()> {
        let mut state = lock(&self.state);
        if state.ceiling != state.current {
            self.file.commit(state.current)?;
            state.ceiling = state.current;
        }
        Ok(())
    }

    fn strategy(&self) -> &'static str {
        "batched"
    }
}

/// Persists every id before handing it out.
#[derive(Debug)]
pub struct PerCallAllocator {
    file: CeilingFile,
    current: Mutex<u64>,
}

impl PerCallAllocator {
    pub fn open(dir: &Path) -> StoreResult<Self> {
        let file = CeilingFile::new(dir);
        let current = file.load()?.unwrap_or(0);
        Ok(Self {
            file,
            current: Mutex::new(current),
        })
    }
}

impl IdAllocator for PerCallAllocator {
    fn next(&self) -> StoreResult<u64> {
        let mut current = lock(&self.current);
        let id = current.checked_add(1).ok_or_else(exhausted)?;
        self.file.commit(id)?;
        *current = id;
        metrics::record_id_allocated(self.strategy());
        Ok(id)
    }

    fn strategy(&self) -> &'static str {
        "per_call"
    }
}

/// Volatile counter for the in-memory backend.
#[derive(Debug, Default)]
pub struct MemoryAllocator {
    current: Mutex<u64>,
}

impl IdAllocator for MemoryAllocator {
    fn next(&self) -> StoreResult<u64> {
        let mut current = lock(&self.current);
        *current = current.checked_add(1).ok_or_else(exhausted)?;
        metrics::record_id_allocated(self.strategy());
        Ok(*current)
    }

    fn strategy(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batched_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let alloc = BatchedAllocator::open(dir.path(), 100).unwrap();

        let ids: Vec<u64> = (0..501).map(|_| alloc.next().unwrap()).collect();
        assert_eq!(ids, (1..=501).collect::<Vec<_>>());

        // 501 ids span six batches of 100
        assert_eq!(CeilingFile::new(dir.path()).load().unwrap(), Some(600));
    }

    #[test]
    fn test_batched_crash_recovery_skips_but_never_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let last = {
            let alloc = BatchedAllocator::open(dir.path(), 1000).unwrap();
            let mut last = 0;
            for _ in 0..250 {
                last = alloc.next().unwrap();
            }
            // dropped without flush: simulated crash
            last
        };
        assert_eq!(last, 250);

        let alloc = BatchedAllocator::open(dir.path(), 1000).unwrap();
        let next = alloc.next().unwrap();
        assert!(next > last);
        assert_eq!(next, 1001);
    }

    #[test]
    fn test_batched_flush_resumes_without_gap() {
        let dir = tempfile::tempdir().unwrap();
        {
            let alloc = BatchedAllocator::open(dir.path(), 1000).unwrap();
            for _ in 0..7 {
                alloc.next().unwrap();
            }
            alloc.flush().unwrap();
        }

        let alloc = BatchedAllocator::open(dir.path(), 1000).unwrap();
        assert_eq!(alloc.next().unwrap(), 8);
    }

    #[test]
    fn test_zero_batch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BatchedAllocator::open(dir.path(), 0).is_err());
    }

    #[test]
    fn test_per_call_persists_every_id() {
        let dir = tempfile::tempdir().unwrap();
        {
            let alloc = PerCallAllocator::open(dir.path()).unwrap();
            assert_eq!(alloc.next().unwrap(), 1);
            assert_eq!(alloc.next().unwrap(), 2);
            assert_eq!(CeilingFile::new(dir.path()).load().unwrap(), Some(2));
        }

        let alloc = PerCallAllocator::open(dir.path()).unwrap();
        assert_eq!(alloc.next().unwrap(), 3);
    }

    #[test]
    fn test_corrupt_ceiling_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CEILING_FILENAME), [1u8, 2, 3]).unwrap();

        let err = BatchedAllocator::open(dir.path(), 10).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_concurrent_callers_never_share_an_id() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let alloc = Arc::new(BatchedAllocator::open(dir.path(), 16).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let alloc = alloc.clone();
                std::thread::spawn(move || (0..100).map(|_| alloc.next().unwrap()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 400);
    }

    #[test]
    fn test_memory_allocator() {
        let alloc = MemoryAllocator::default();
        assert_eq!(alloc.next().unwrap(), 1);
        assert_eq!(alloc.next().unwrap(), 2);
    }
}
