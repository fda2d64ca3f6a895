//! DynamoDB convenience client.
//!
//! Pairs the codec and table model from `ddbkit_core` with concrete
//! backends: DynamoDB through `aws-sdk-dynamodb`, and an in-memory store
//! for tests.
//!
//! ```rust,ignore
//! use ddbkit::{DdbClient, Key, TableDefinition};
//!
//! let client = DdbClient::from_env()
//!     .await
//!     .add_table(TableDefinition::new("users"));
//! client.insert("users", &user).await?;
//! let found: Option<User> = client.find_by_key("users", &Key::pk("user_1")).await?;
//! ```

pub mod client;
pub mod config;
pub mod storage;

pub use client::DdbClient;
pub use config::Config;
pub use ddbkit_core::{
    AttributeType, BillingMode, Item, Key, KeyValue, Result, RetryPolicy, StoreError,
    TableDefinition, TableInfo, TableStatus,
};
