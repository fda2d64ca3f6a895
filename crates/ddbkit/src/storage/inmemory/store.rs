//! In-memory store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use ddbkit_core::{
    Item, ItemStore, Key, KeySchema, Result, StoreError, TableAdmin, TableDefinition, TableInfo,
    TableStatus, UpdatePlan,
};

#[derive(Debug)]
struct MemTable {
    definition: TableDefinition,
    created_at: DateTime<Utc>,
    /// Describe calls left before the table reports `ACTIVE`.
    creating_polls: u32,
    items: HashMap<Key, Item>,
}

impl MemTable {
    fn schema(&self) -> KeySchema {
        self.definition.key_schema()
    }

    fn key_of(&self, item: &Item) -> Result<Key> {
        let key = self.schema().key_of(item).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "item is missing key attributes for {}",
                self.definition.table_name
            ))
        })?;
        self.check_key(&key)?;
        Ok(key)
    }

    /// Keys must name exactly the table's key attributes, with the declared
    /// attribute types.
    fn check_key(&self, key: &Key) -> Result<()> {
        let definition = &self.definition;
        let partition_ok = key.partition.0 == definition.partition_key.name
            && key.partition.1.attribute_type() == definition.partition_key.attribute_type;
        let sort_ok = match (&key.sort, &definition.sort_key) {
            (Some((name, value)), Some(attr)) => {
                *name == attr.name && value.attribute_type() == attr.attribute_type
            }
            (None, None) => true,
            _ => false,
        };

        if !partition_ok || !sort_ok {
            return Err(StoreError::InvalidData(format!(
                "key {key} does not match the schema of {}",
                definition.table_name
            )));
        }
        Ok(())
    }

    fn info(&self, status: TableStatus) -> TableInfo {
        TableInfo {
            table_name: self.definition.table_name.clone(),
            status,
            item_count: self.items.len() as i64,
            // Not tracked.
            size_bytes: 0,
            created_at: Some(self.created_at),
            billing_mode: self.definition.billing_mode,
            key_schema: self.schema(),
            arn: None,
            id: None,
        }
    }
}

/// In-memory storage backend for testing.
///
/// Uses a HashMap wrapped in `Arc<RwLock<_>>` for thread-safe access.
/// Data is not persisted and will be lost when the store is dropped.
/// Item operations on a table that is still creating fail with
/// `TableNotFound`, as they do against DynamoDB.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, MemTable>>>,
    creating_polls: u32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty in-memory store. Tables are active immediately.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            creating_polls: 0,
        }
    }

    /// New tables report `CREATING` for this many describe calls.
    pub fn with_creating_polls(mut self, polls: u32) -> Self {
        self.creating_polls = polls;
        self
    }
}

fn active_table<'a>(tables: &'a HashMap<String, MemTable>, table: &str) -> Result<&'a MemTable> {
    match tables.get(table) {
        Some(t) if t.creating_polls == 0 => Ok(t),
        _ => Err(StoreError::TableNotFound(table.to_string())),
    }
}

fn active_table_mut<'a>(
    tables: &'a mut HashMap<String, MemTable>,
    table: &str,
) -> Result<&'a mut MemTable> {
    match tables.get_mut(table) {
        Some(t) if t.creating_polls == 0 => Ok(t),
        _ => Err(StoreError::TableNotFound(table.to_string())),
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let mut tables = self.tables.write().await;
        let t = active_table_mut(&mut tables, table)?;
        let key = t.key_of(&item)?;
        t.items.insert(key, item);
        Ok(())
    }

    async fn insert_item(&self, table: &str, item: Item) -> Result<()> {
        let mut tables = self.tables.write().await;
        let t = active_table_mut(&mut tables, table)?;
        let key = t.key_of(&item)?;
        if t.items.contains_key(&key) {
            return Err(StoreError::ItemAlreadyExists {
                table: table.to_string(),
                key: key.to_string(),
            });
        }
        t.items.insert(key, item);
        Ok(())
    }

    async fn insert_items(&self, table: &str, items: Vec<Item>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let t = active_table_mut(&mut tables, table)?;
        let mut keyed: HashMap<Key, Item> = HashMap::with_capacity(items.len());
        for item in items {
            let key = t.key_of(&item)?;
            if keyed.contains_key(&key) {
                return Err(StoreError::InvalidData(format!(
                    "batch for {table} contains duplicate key {key}"
                )));
            }
            keyed.insert(key, item);
        }
        t.items.extend(keyed);
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        let t = active_table(&tables, table)?;
        t.check_key(key)?;
        Ok(t.items.get(key).cloned())
    }

    async fn scan_items(&self, table: &str) -> Result<Vec<Item>> {
        let tables = self.tables.read().await;
        let t = active_table(&tables, table)?;
        Ok(t.items.values().cloned().collect())
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let t = active_table_mut(&mut tables, table)?;
        t.check_key(key)?;
        Ok(t.items.remove(key).is_some())
    }

    async fn update_item(&self, table: &str, key: &Key, changes: Item) -> Result<()> {
        let mut tables = self.tables.write().await;
        let t = active_table_mut(&mut tables, table)?;
        t.check_key(key)?;
        let plan = UpdatePlan::from_item(&changes, &t.schema())?;
        let item = t.items.get_mut(key).ok_or_else(|| StoreError::ItemNotFound {
            table: table.to_string(),
            key: key.to_string(),
        })?;
        plan.apply(item);
        Ok(())
    }
}

#[async_trait]
impl TableAdmin for InMemoryStore {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let mut tables = self.tables.write().await;
        let name = &definition.table_name;
        if tables.contains_key(name) {
            return Err(StoreError::TableAlreadyExists(name.clone()));
        }

        tables.insert(
            name.clone(),
            MemTable {
                definition: definition.clone(),
                created_at: Utc::now(),
                creating_polls: self.creating_polls,
                items: HashMap::new(),
            },
        );
        tracing::info!(table = %name, "table created");
        Ok(())
    }

    async fn describe_table(&self, table: &str) -> Result<Option<TableInfo>> {
        let mut tables = self.tables.write().await;
        let Some(t) = tables.get_mut(table) else {
            return Ok(None);
        };

        if t.creating_polls > 0 {
            t.creating_polls -= 1;
            return Ok(Some(t.info(TableStatus::Creating)));
        }
        Ok(Some(t.info(TableStatus::Active)))
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.remove(table).is_none() {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        tracing::info!(table, "table deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;
    use ddbkit_core::{AttributeType, RetryPolicy};

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn user(pk: &str, sk: &str, name: &str) -> Item {
        Item::from([
            ("PK".to_string(), s(pk)),
            ("SK".to_string(), s(sk)),
            ("Name".to_string(), s(name)),
        ])
    }

    async fn store_with_users() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_table(&TableDefinition::new("users").with_sort_key("SK", AttributeType::String))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = store_with_users().await;
        store.insert_item("users", user("1", "1", "test")).await.unwrap();

        let item = store
            .get_item("users", &Key::pk_sk("1", "1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item["Name"], s("test"));

        let missing = store.get_item("users", &Key::pk_sk("1", "2")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_fails() {
        let store = store_with_users().await;
        store.insert_item("users", user("1", "1", "a")).await.unwrap();

        let result = store.insert_item("users", user("1", "1", "b")).await;
        assert_eq!(
            result,
            Err(StoreError::ItemAlreadyExists {
                table: "users".to_string(),
                key: "PK=1,SK=1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = store_with_users().await;
        store.put_item("users", user("1", "1", "a")).await.unwrap();
        store.put_item("users", user("1", "1", "b")).await.unwrap();

        let items = store.scan_items("users").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["Name"], s("b"));
    }

    #[tokio::test]
    async fn test_item_without_key_is_rejected() {
        let store = store_with_users().await;
        let item = Item::from([("PK".to_string(), s("1"))]);

        let result = store.insert_item("users", item).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_key_must_match_schema() {
        let store = store_with_users().await;
        let result = store.get_item("users", &Key::pk("1")).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_key_types_must_match_definition() {
        let store = store_with_users().await;

        let mut item = user("1", "1", "a");
        item.insert("SK".to_string(), AttributeValue::N("1".to_string()));
        let result = store.put_item("users", item).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));

        let result = store
            .get_item("users", &Key::partition("PK", 1_i64).with_sort("SK", "1"))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_batch_with_duplicate_keys_is_rejected() {
        let store = store_with_users().await;
        let batch = vec![
            user("1", "1", "a"),
            user("2", "2", "b"),
            user("1", "1", "c"),
        ];

        let result = store.insert_items("users", batch).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
        assert!(store.scan_items("users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let store = store_with_users().await;
        store.insert_item("users", user("1", "1", "a")).await.unwrap();

        assert!(store.delete_item("users", &Key::pk_sk("1", "1")).await.unwrap());
        assert!(!store.delete_item("users", &Key::pk_sk("1", "1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_sets_fields() {
        let store = store_with_users().await;
        store.insert_item("users", user("1", "1", "a")).await.unwrap();

        let changes = Item::from([("Age".to_string(), AttributeValue::N("30".into()))]);
        store
            .update_item("users", &Key::pk_sk("1", "1"), changes)
            .await
            .unwrap();

        let item = store
            .get_item("users", &Key::pk_sk("1", "1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item["Age"], AttributeValue::N("30".into()));
        assert_eq!(item["Name"], s("a"));
    }

    #[tokio::test]
    async fn test_update_missing_item_fails() {
        let store = store_with_users().await;
        let changes = Item::from([("Age".to_string(), AttributeValue::N("30".into()))]);

        let result = store
            .update_item("users", &Key::pk_sk("9", "9"), changes)
            .await;
        assert!(matches!(result, Err(StoreError::ItemNotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = InMemoryStore::new();

        assert_eq!(store.describe_table("nope").await.unwrap(), None);
        assert_eq!(
            store.scan_items("nope").await,
            Err(StoreError::TableNotFound("nope".to_string()))
        );
        assert_eq!(
            store.drop_table("nope").await,
            Err(StoreError::TableNotFound("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let store = store_with_users().await;
        let result = store.create_table(&TableDefinition::new("users")).await;
        assert_eq!(
            result,
            Err(StoreError::TableAlreadyExists("users".to_string()))
        );
    }

    #[tokio::test]
    async fn test_list_tables_sorted() {
        let store = InMemoryStore::new();
        for name in ["b", "a", "c"] {
            store.create_table(&TableDefinition::new(name)).await.unwrap();
        }
        assert_eq!(store.list_tables().await.unwrap(), vec!["a", "b", "c"]);

        store.drop_table("b").await.unwrap();
        assert_eq!(store.list_tables().await.unwrap(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_wait_for_creating_table() {
        let store = InMemoryStore::new().with_creating_polls(2);
        store.create_table(&TableDefinition::new("slow")).await.unwrap();

        let info = store.describe_table("slow").await.unwrap().unwrap();
        assert_eq!(info.status, TableStatus::Creating);

        store
            .wait_for_table_active("slow", &RetryPolicy::immediate(5))
            .await
            .unwrap();
        assert!(store.is_table_active("slow").await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_gives_up() {
        let store = InMemoryStore::new().with_creating_polls(10);
        store.create_table(&TableDefinition::new("slow")).await.unwrap();

        let result = store
            .wait_for_table_active("slow", &RetryPolicy::immediate(3))
            .await;
        assert_eq!(
            result,
            Err(StoreError::TableActivationTimeout {
                table: "slow".to_string(),
                attempts: 3
            })
        );
    }

    #[tokio::test]
    async fn test_ensure_table_creates_once() {
        let store = InMemoryStore::new().with_creating_polls(1);
        let definition = TableDefinition::new("users");
        let policy = RetryPolicy::immediate(5);

        store.ensure_table(&definition, &policy).await.unwrap();
        store.ensure_table(&definition, &policy).await.unwrap();

        assert_eq!(store.list_tables().await.unwrap(), vec!["users"]);
    }

    #[tokio::test]
    async fn test_item_ops_fail_while_creating() {
        let store = InMemoryStore::new().with_creating_polls(1);
        store.create_table(&TableDefinition::new("users")).await.unwrap();

        let item = Item::from([("PK".to_string(), s("1"))]);
        assert!(matches!(
            store.put_item("users", item).await,
            Err(StoreError::TableNotFound(_))
        ));
    }
}
