//! Functional core for ddbkit.
//!
//! Everything here is free of network I/O: attribute-value marshaling, key
//! and table models, update expressions, and the backend traits implemented
//! by the `ddbkit` crate.

pub mod codec;
pub mod error;
pub mod key;
pub mod table;
pub mod traits;
pub mod update;

pub use codec::{from_item, from_items, item_to_json, json_to_item, to_item, CodecError, Item};
pub use error::{Result, StoreError};
pub use key::{Key, KeySchema, KeyValue, PRIMARY_KEY, SORT_KEY};
pub use table::{
    AttributeType, BillingMode, KeyAttribute, RetryPolicy, TableDefinition, TableInfo,
    TableStatus, Throughput,
};
pub use traits::{ItemStore, TableAdmin};
pub use update::UpdatePlan;
