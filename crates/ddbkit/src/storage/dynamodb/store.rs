//! DynamoDB store implementation.
//!
//! Implements `ItemStore` and `TableAdmin` from `ddbkit_core::traits` on top
//! of `aws-sdk-dynamodb`.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{PutRequest, ReturnValue, WriteRequest};
use aws_sdk_dynamodb::Client;
use tokio::sync::RwLock;

use ddbkit_core::{
    Item, ItemStore, Key, KeySchema, Result, RetryPolicy, StoreError, TableAdmin,
    TableDefinition, TableInfo, UpdatePlan,
};

use super::conversions::{billing_parts, key_schema_parts, table_description_to_info};
use super::error::{
    is_table_missing, map_batch_write_error, map_create_table_error, map_delete_item_error,
    map_delete_table_error, map_describe_table_error, map_get_item_error, map_list_tables_error,
    map_put_item_error, map_scan_error, map_update_item_error,
};
use crate::config::Config;

/// Maximum number of write requests in one `BatchWriteItem` call.
const BATCH_SIZE: usize = 25;

/// Create a DynamoDB client for the configured region and endpoint.
pub async fn create_client(config: &Config) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;
    Client::new(&sdk_config)
}

/// DynamoDB-backed store.
///
/// Key schemas are looked up with `DescribeTable` the first time a table is
/// used and cached afterwards.
pub struct DynamoDbStore {
    client: Client,
    schemas: RwLock<HashMap<String, KeySchema>>,
    batch_retry: RetryPolicy,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            schemas: RwLock::new(HashMap::new()),
            batch_retry: RetryPolicy::default(),
        }
    }

    /// Creates a new store from configuration, using the SDK default
    /// credential chain.
    pub async fn from_config(config: &Config) -> Self {
        Self::new(create_client(config).await).with_batch_retry(config.retry_policy())
    }

    /// Policy for resubmitting unprocessed batch items.
    pub fn with_batch_retry(mut self, policy: RetryPolicy) -> Self {
        self.batch_retry = policy;
        self
    }

    /// The underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn key_schema(&self, table: &str) -> Result<KeySchema> {
        let cached = self.schemas.read().await.get(table).cloned();
        if let Some(schema) = cached {
            return Ok(schema);
        }

        let info = self
            .describe_table(table)
            .await?
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        self.schemas
            .write()
            .await
            .insert(table.to_string(), info.key_schema.clone());
        Ok(info.key_schema)
    }

    async fn write_batch(&self, table: &str, requests: Vec<WriteRequest>) -> Result<()> {
        let mut pending = requests;

        for attempt in 1..=self.batch_retry.max_attempts.max(1) {
            let output = self
                .client
                .batch_write_item()
                .request_items(table, pending)
                .send()
                .await
                .map_err(|e| map_batch_write_error(e, table))?;

            pending = output
                .unprocessed_items
                .and_then(|mut unprocessed| unprocessed.remove(table))
                .unwrap_or_default();

            if pending.is_empty() {
                return Ok(());
            }

            tracing::warn!(
                table,
                attempt,
                unprocessed = pending.len(),
                "batch write left unprocessed items"
            );
            self.batch_retry.backoff(attempt).await;
        }

        Err(StoreError::Throttled(format!(
            "{} items left unprocessed in {table}",
            pending.len()
        )))
    }
}

#[async_trait]
impl ItemStore for DynamoDbStore {
    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table, ""))?;

        Ok(())
    }

    async fn insert_item(&self, table: &str, item: Item) -> Result<()> {
        let schema = self.key_schema(table).await?;
        let key = schema
            .key_of(&item)
            .ok_or_else(|| {
                StoreError::InvalidData(format!("item is missing key attributes for {table}"))
            })?
            .to_string();

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", schema.partition)
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table, key))?;

        Ok(())
    }

    async fn insert_items(&self, table: &str, items: Vec<Item>) -> Result<()> {
        let total = items.len();
        let mut requests = Vec::with_capacity(total);
        for item in items {
            let put = PutRequest::builder()
                .set_item(Some(item))
                .build()
                .map_err(|e| StoreError::InvalidData(e.to_string()))?;
            requests.push(WriteRequest::builder().put_request(put).build());
        }

        let mut batches = 0;
        while !requests.is_empty() {
            let rest = requests.split_off(requests.len().min(BATCH_SIZE));
            self.write_batch(table, requests).await?;
            requests = rest;
            batches += 1;
        }

        tracing::info!(table, items = total, batches, "batch write complete");
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key.to_item()))
            .send()
            .await
            .map_err(|e| map_get_item_error(e, table))?;

        Ok(result.item)
    }

    async fn scan_items(&self, table: &str) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key = None;

        loop {
            let page = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| map_scan_error(e, table))?;

            items.extend(page.items.unwrap_or_default());

            match page.last_evaluated_key {
                Some(last) if !last.is_empty() => start_key = Some(last),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<bool> {
        let result = self
            .client
            .delete_item()
            .table_name(table)
            .set_key(Some(key.to_item()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, table, key.to_string()))?;

        Ok(result.attributes.is_some_and(|old| !old.is_empty()))
    }

    async fn update_item(&self, table: &str, key: &Key, changes: Item) -> Result<()> {
        let schema = self.key_schema(table).await?;
        let plan = UpdatePlan::from_item(&changes, &schema)?;
        let condition = plan.condition();

        self.client
            .update_item()
            .table_name(table)
            .set_key(Some(key.to_item()))
            .update_expression(plan.expression)
            .set_expression_attribute_names(Some(plan.names))
            .set_expression_attribute_values(Some(plan.values))
            .condition_expression(condition)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, table, key.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl TableAdmin for DynamoDbStore {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let table = definition.table_name.as_str();
        let (key_schema, attribute_definitions) = key_schema_parts(definition)?;
        let (billing_mode, throughput) = billing_parts(&definition.billing_mode)?;

        self.client
            .create_table()
            .table_name(table)
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .billing_mode(billing_mode)
            .set_provisioned_throughput(throughput)
            .send()
            .await
            .map_err(|e| map_create_table_error(e, table))?;

        self.schemas
            .write()
            .await
            .insert(table.to_string(), definition.key_schema());

        tracing::info!(table, "table created");
        Ok(())
    }

    async fn describe_table(&self, table: &str) -> Result<Option<TableInfo>> {
        let output = match self.client.describe_table().table_name(table).send().await {
            Ok(output) => output,
            Err(err) if is_table_missing(&err) => return Ok(None),
            Err(err) => return Err(map_describe_table_error(err)),
        };

        output
            .table
            .as_ref()
            .map(table_description_to_info)
            .transpose()
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut start = None;

        loop {
            let page = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(map_list_tables_error)?;

            names.extend(page.table_names.unwrap_or_default());

            match page.last_evaluated_table_name {
                Some(last) => start = Some(last),
                None => break,
            }
        }

        Ok(names)
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| map_delete_table_error(e, table))?;

        self.schemas.write().await.remove(table);

        tracing::info!(table, "table deleted");
        Ok(())
    }
}
