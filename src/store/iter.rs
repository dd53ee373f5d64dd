//! Lazy iteration over decoded store entries.
//!
//! # Responsibilities
//! - Adapt a backend's native ordered cursor into decoded entities
//! - Distinguish a clean end of scan (`Ok(None)`) from a failure
//! - Honour caller-supplied cancellation between steps
//!
//! # Design Decisions
//! - Single pass: a fresh iterator is needed to rescan
//! - The first error closes the iterator; corrupt records are never skipped
//! - `close()` is idempotent and also runs on drop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::store::error::{StoreError, StoreResult};

/// Raw key/value pairs produced by a backend, in ascending key order.
pub type RawEntries = Box<dyn Iterator<Item = StoreResult<(Vec<u8>, Vec<u8>)>>>;

/// Decodes one raw entry.
pub type DecodeFn<T> = fn(&[u8], &[u8]) -> StoreResult<T>;

/// Cancellation signal for long scans.
///
/// Clones share the same flag, so one handle can cancel a scan running on
/// another thread.
#[derive(Debug, Clone, Default)]
pub struct ScanCancel {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl ScanCancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also fires once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }
}

/// A forward-only iterator over decoded entries.
pub struct StoreIter<T> {
    entries: Option<RawEntries>,
    decode: DecodeFn<T>,
    cancel: Option<ScanCancel>,
    remaining: Option<usize>,
}

impl<T> StoreIter<T> {
    pub fn new(entries: RawEntries, decode: DecodeFn<T>) -> Self {
        Self {
            entries: Some(entries),
            decode,
            cancel: None,
            remaining: None,
        }
    }

    /// Stop after at most `limit` entries.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.remaining = limit;
        self
    }

    /// Check `cancel` before every step.
    pub fn with_cancel(mut self, cancel: Option<ScanCancel>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Advance the scan.
    ///
    /// Returns `Ok(None)` once the scan is done. An error closes the iterator.
    pub fn next_entry(&mut self) -> StoreResult<Option<T>> {
        if self.remaining == Some(0) {
            self.close();
        }

        let Some(entries) = self.entries.as_mut() else {
            return Ok(None);
        };

        if self.cancel.as_ref().map(ScanCancel::is_cancelled).unwrap_or(false) {
            self.close();
            return Err(StoreError::Cancelled);
        }

        let decoded = match entries.next() {
            None => {
                self.close();
                return Ok(None);
            }
            Some(Ok((key, val))) => (self.decode)(&key, &val),
            Some(Err(e)) => Err(e),
        };

        match decoded {
            Ok(item) => {
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                Ok(Some(item))
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    /// Release the native cursor. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.entries = None;
    }

    pub fn is_closed(&self) -> bool {
        self.entries.is_none()
    }

    /// Drain the remaining entries into a vector.
    pub fn collect_all(mut self) -> StoreResult<Vec<T>> {
        let mut out = Vec::new();
        while let Some(item) = self.next_entry()? {
            out.push(item);
        }
        Ok(out)
    }
}

impl<T> Iterator for StoreIter<T> {
    type Item = StoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
