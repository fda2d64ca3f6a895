use async_trait::async_trait;

use crate::codec::Item;
use crate::error::{Result, StoreError};
use crate::key::Key;
use crate::table::{RetryPolicy, TableDefinition, TableInfo, TableStatus};

/// Item-level operations against a backend.
///
/// Key attribute names are resolved from the table itself, so callers only
/// hand over items and keys.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Writes an item, replacing any item with the same key.
    async fn put_item(&self, table: &str, item: Item) -> Result<()>;

    /// Writes an item only if no item with the same key exists.
    async fn insert_item(&self, table: &str, item: Item) -> Result<()>;

    /// Writes many items. Existing items with the same keys are replaced.
    async fn insert_items(&self, table: &str, items: Vec<Item>) -> Result<()>;

    /// Gets an item by its key.
    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Item>>;

    /// Reads every item in the table.
    async fn scan_items(&self, table: &str) -> Result<Vec<Item>>;

    /// Deletes an item. Returns whether an item was removed.
    async fn delete_item(&self, table: &str, key: &Key) -> Result<bool>;

    /// Sets the given attributes on an existing item.
    async fn update_item(&self, table: &str, key: &Key, changes: Item) -> Result<()>;
}

/// Table-level operations against a backend.
#[async_trait]
pub trait TableAdmin: Send + Sync {
    /// Creates a table. Fails with `TableAlreadyExists` if it exists.
    async fn create_table(&self, definition: &TableDefinition) -> Result<()>;

    /// Describes a table, `None` when it does not exist.
    async fn describe_table(&self, table: &str) -> Result<Option<TableInfo>>;

    /// Lists all table names.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Deletes a table.
    async fn drop_table(&self, table: &str) -> Result<()>;

    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.describe_table(table).await?.is_some())
    }

    async fn is_table_active(&self, table: &str) -> Result<bool> {
        Ok(self
            .describe_table(table)
            .await?
            .is_some_and(|info| info.status == TableStatus::Active))
    }

    /// Polls until the table reports `ACTIVE`.
    async fn wait_for_table_active(&self, table: &str, policy: &RetryPolicy) -> Result<()> {
        for attempt in 1..=policy.max_attempts {
            if self.is_table_active(table).await? {
                tracing::debug!(table, attempt, "table is active");
                return Ok(());
            }
            tracing::info!(table, attempt, "waiting for table to become active");
            policy.backoff(attempt).await;
        }

        Err(StoreError::TableActivationTimeout {
            table: table.to_string(),
            attempts: policy.max_attempts,
        })
    }

    /// Creates the table when it is missing and waits until it is active.
    ///
    /// A concurrent creator winning the race is not an error.
    async fn ensure_table(&self, definition: &TableDefinition, policy: &RetryPolicy) -> Result<()> {
        let table = definition.table_name.as_str();
        if !self.table_exists(table).await? {
            tracing::info!(table, "table missing, creating");
            match self.create_table(definition).await {
                Ok(()) | Err(StoreError::TableAlreadyExists(_)) => {}
                Err(err) => return Err(err),
            }
        }
        self.wait_for_table_active(table, policy).await
    }
}
