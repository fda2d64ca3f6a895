//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of the store traits
//! that keeps every table in a HashMap wrapped in `Arc<RwLock<_>>`. This is
//! useful for testing and for offline use of `DdbClient`.
//!
//! # Example
//!
//! ```rust,ignore
//! use ddbkit::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new().with_creating_polls(2);
//! // Use store for testing...
//! ```

mod store;

pub use store::InMemoryStore;
