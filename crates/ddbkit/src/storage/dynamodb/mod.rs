//! DynamoDB storage backend.
//!
//! Implements the store traits from `ddbkit_core::traits` using
//! `aws-sdk-dynamodb`.

mod conversions;
mod error;
mod store;

pub use store::{create_client, DynamoDbStore};
