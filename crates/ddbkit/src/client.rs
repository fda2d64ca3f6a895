//! High-level client over a store backend.
//!
//! `DdbClient` keeps a registry of table definitions. Writes to a registered
//! table flagged for creation first make sure the table exists and is
//! active, creating it when missing.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use ddbkit_core::{
    from_item, from_items, to_item, ItemStore, Key, Result, RetryPolicy, StoreError, TableAdmin,
    TableDefinition, TableInfo,
};

use crate::config::Config;
use crate::storage::DynamoDbStore;

pub struct DdbClient<S = DynamoDbStore> {
    store: S,
    tables: HashMap<String, TableDefinition>,
    retry: RetryPolicy,
}

impl DdbClient<DynamoDbStore> {
    /// Client configured from the environment. See [`Config::from_env`].
    pub async fn from_env() -> Self {
        Self::from_config(&Config::from_env()).await
    }

    pub async fn from_config(config: &Config) -> Self {
        Self::new(DynamoDbStore::from_config(config).await).with_retry(config.retry_policy())
    }
}

impl<S: ItemStore + TableAdmin> DdbClient<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tables: HashMap::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Polling policy used while waiting for tables to become active.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Register a table. A later registration with the same name wins.
    pub fn add_table(mut self, definition: TableDefinition) -> Self {
        self.tables
            .insert(definition.table_name.clone(), definition);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    /// Create every registered table flagged for creation and wait for it to
    /// become active. Fails on the first table that cannot be created,
    /// including one that already exists.
    pub async fn start(&self) -> Result<()> {
        let mut definitions: Vec<&TableDefinition> =
            self.tables.values().filter(|d| d.create).collect();
        definitions.sort_by(|a, b| a.table_name.cmp(&b.table_name));

        tracing::info!(
            tables = self.tables.len(),
            creating = definitions.len(),
            "starting client"
        );

        for definition in definitions {
            let table = definition.table_name.as_str();
            if let Err(err) = self.store.create_table(definition).await {
                tracing::error!(table, error = %err, "failed to create table");
                return Err(err);
            }
            self.store.wait_for_table_active(table, &self.retry).await?;
        }

        Ok(())
    }

    /// Make sure a registered table exists before writing to it.
    async fn prepare(&self, table: &str) -> Result<()> {
        match self.tables.get(table) {
            Some(definition) if definition.create => {
                self.store.ensure_table(definition, &self.retry).await
            }
            _ => Ok(()),
        }
    }

    /// Insert a new item. Fails with `ItemAlreadyExists` when an item with
    /// the same key is already stored.
    pub async fn insert<T: Serialize + ?Sized>(&self, table: &str, value: &T) -> Result<()> {
        let item = to_item(value)?;
        self.prepare(table).await?;
        self.store.insert_item(table, item).await
    }

    /// Insert or replace an item.
    pub async fn put<T: Serialize + ?Sized>(&self, table: &str, value: &T) -> Result<()> {
        let item = to_item(value)?;
        self.prepare(table).await?;
        self.store.put_item(table, item).await
    }

    /// Write many items. Existing items with the same keys are replaced.
    pub async fn insert_batch<T: Serialize>(&self, table: &str, values: &[T]) -> Result<()> {
        let items = values.iter().map(to_item).collect::<std::result::Result<Vec<_>, _>>()?;
        if items.is_empty() {
            return Ok(());
        }
        self.prepare(table).await?;
        self.store.insert_items(table, items).await
    }

    /// Look up an item by key. `Ok(None)` when no item has that key.
    pub async fn find_by_key<T: DeserializeOwned>(&self, table: &str, key: &Key) -> Result<Option<T>> {
        match self.store.get_item(table, key).await? {
            Some(item) => Ok(Some(from_item(&item)?)),
            None => Ok(None),
        }
    }

    /// Read and decode every item in the table.
    pub async fn scan_all<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let items = self.store.scan_items(table).await?;
        Ok(from_items(&items)?)
    }

    /// Delete an item. Returns whether an item was removed.
    pub async fn delete(&self, table: &str, key: &Key) -> Result<bool> {
        self.store.delete_item(table, key).await
    }

    /// Set the serialized fields of `changes` on an existing item. Key
    /// attributes cannot be part of the change set.
    pub async fn update_partial<U: Serialize + ?Sized>(
        &self,
        table: &str,
        key: &Key,
        changes: &U,
    ) -> Result<()> {
        let changes = to_item(changes)?;
        self.store.update_item(table, key, changes).await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.store.list_tables().await
    }

    /// Describe a table. Fails with `TableNotFound` when it does not exist.
    pub async fn describe_table(&self, table: &str) -> Result<TableInfo> {
        self.store
            .describe_table(table)
            .await?
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    pub async fn drop_table(&self, table: &str) -> Result<()> {
        self.store.drop_table(table).await
    }
}
