//! Store error taxonomy.

use thiserror::Error;

/// Errors that can occur during route store operations.
///
/// A missing route is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A client supplied a pagination cursor that does not decode.
    #[error("bad cursor: {0}")]
    BadCursor(String),

    /// A client supplied a pattern or name the store cannot accept.
    #[error("bad input: {0}")]
    BadInput(String),

    /// A stored value failed validation (too short, unknown version).
    #[error("corrupt value: {0}")]
    CorruptValue(String),

    /// A stored key is not a route key or does not compile as a pattern.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Filesystem failure (identifier ceiling file, data directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by the embedded storage engine.
    #[error("storage engine error: {0}")]
    Engine(#[from] redb::Error),

    /// A scan was abandoned because its cancellation token fired.
    #[error("scan cancelled")]
    Cancelled,
}

impl StoreError {
    /// True for errors caused by caller input rather than the store itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, StoreError::BadCursor(_) | StoreError::BadInput(_))
    }

    /// True for data integrity violations.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::CorruptValue(_) | StoreError::InvalidKey(_))
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::BadCursor(_) => "bad_cursor",
            StoreError::BadInput(_) => "bad_input",
            StoreError::CorruptValue(_) => "corrupt_value",
            StoreError::InvalidKey(_) => "invalid_key",
            StoreError::Io(_) => "io",
            StoreError::Engine(_) => "engine",
            StoreError::Cancelled => "cancelled",
        }
    }
}

macro_rules! engine_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Engine(e.into())
                }
            }
        )*
    };
}

engine_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
