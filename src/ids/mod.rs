//! Identifier subsystem.
//!
//! # Data Flow
//! ```text
//! POST with no name
//!     → RouteStore::next_id()
//!     → allocator.rs (mutex, ceiling file) or the engine's counter key
//!     → encoding.rs (":" + base62)
//!     → generated route name
//! ```
//!
//! # Design Decisions
//! - Allocators are owned by a store instance, never global
//! - Strategy chosen by configuration per backend
//! - Generated names carry a sentinel user names cannot start with

pub mod allocator;
pub mod encoding;

pub use allocator::{BatchedAllocator, IdAllocator, MemoryAllocator, PerCallAllocator};
pub use encoding::{clean_name, decode_id, encode_id, is_generated};
