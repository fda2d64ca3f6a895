//! Storage backend implementations.
//!
//! This module provides concrete implementations of the store traits
//! defined in `ddbkit_core::traits`.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-memory backend used by tests and offline runs
//!
//! The DynamoDB backend is always available.

pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub mod inmemory;

pub use dynamodb::DynamoDbStore;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;
