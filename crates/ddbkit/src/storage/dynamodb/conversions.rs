//! Conversions between `ddbkit_core` table types and SDK types.

use aws_sdk_dynamodb::primitives::DateTime as AwsDateTime;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode as AwsBillingMode, KeySchemaElement, KeyType,
    ProvisionedThroughput, ScalarAttributeType, TableDescription,
    TableStatus as AwsTableStatus,
};
use chrono::{DateTime, Utc};

use ddbkit_core::{
    AttributeType, BillingMode, KeyAttribute, KeySchema, Result, StoreError, TableDefinition,
    TableInfo, TableStatus, Throughput,
};

fn build_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidData(err.to_string())
}

pub fn to_scalar_type(attribute_type: AttributeType) -> ScalarAttributeType {
    match attribute_type {
        AttributeType::String => ScalarAttributeType::S,
        AttributeType::Number => ScalarAttributeType::N,
        AttributeType::Binary => ScalarAttributeType::B,
    }
}

fn key_element(key: &KeyAttribute, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(&key.name)
        .key_type(key_type)
        .build()
        .map_err(build_error)
}

fn attribute_definition(key: &KeyAttribute) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(&key.name)
        .attribute_type(to_scalar_type(key.attribute_type))
        .build()
        .map_err(build_error)
}

/// Key schema elements and attribute definitions for `CreateTable`.
pub fn key_schema_parts(
    definition: &TableDefinition,
) -> Result<(Vec<KeySchemaElement>, Vec<AttributeDefinition>)> {
    let mut key_schema = vec![key_element(&definition.partition_key, KeyType::Hash)?];
    let mut attribute_definitions = vec![attribute_definition(&definition.partition_key)?];

    if let Some(sk) = &definition.sort_key {
        key_schema.push(key_element(sk, KeyType::Range)?);
        attribute_definitions.push(attribute_definition(sk)?);
    }

    Ok((key_schema, attribute_definitions))
}

/// Billing mode plus provisioned throughput, if any.
pub fn billing_parts(
    billing_mode: &BillingMode,
) -> Result<(AwsBillingMode, Option<ProvisionedThroughput>)> {
    match billing_mode {
        BillingMode::OnDemand => Ok((AwsBillingMode::PayPerRequest, None)),
        BillingMode::Provisioned(throughput) => {
            let provisioned = ProvisionedThroughput::builder()
                .read_capacity_units(throughput.read_capacity_units)
                .write_capacity_units(throughput.write_capacity_units)
                .build()
                .map_err(build_error)?;
            Ok((AwsBillingMode::Provisioned, Some(provisioned)))
        }
    }
}

pub fn from_table_status(status: Option<&AwsTableStatus>) -> TableStatus {
    match status {
        Some(AwsTableStatus::Active) => TableStatus::Active,
        Some(AwsTableStatus::Creating) => TableStatus::Creating,
        Some(AwsTableStatus::Updating) => TableStatus::Updating,
        Some(AwsTableStatus::Deleting) => TableStatus::Deleting,
        Some(AwsTableStatus::Archiving) => TableStatus::Archiving,
        Some(AwsTableStatus::Archived) => TableStatus::Archived,
        Some(AwsTableStatus::InaccessibleEncryptionCredentials) => TableStatus::Inaccessible,
        _ => TableStatus::Unknown,
    }
}

fn to_chrono(timestamp: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

fn key_schema_of(table: &TableDescription) -> Result<KeySchema> {
    let mut partition = None;
    let mut sort = None;
    for element in table.key_schema() {
        match element.key_type() {
            KeyType::Hash => partition = Some(element.attribute_name().to_string()),
            KeyType::Range => sort = Some(element.attribute_name().to_string()),
            _ => {}
        }
    }

    let partition = partition.ok_or_else(|| {
        StoreError::InvalidData(format!(
            "table {} has no partition key",
            table.table_name().unwrap_or_default()
        ))
    })?;
    Ok(KeySchema::new(partition, sort))
}

fn billing_mode_of(table: &TableDescription) -> BillingMode {
    let on_demand = table
        .billing_mode_summary()
        .and_then(|summary| summary.billing_mode())
        .is_some_and(|mode| *mode == AwsBillingMode::PayPerRequest);
    if on_demand {
        return BillingMode::OnDemand;
    }

    match table.provisioned_throughput() {
        Some(throughput) => BillingMode::Provisioned(Throughput {
            read_capacity_units: throughput.read_capacity_units().unwrap_or(0),
            write_capacity_units: throughput.write_capacity_units().unwrap_or(0),
        }),
        None => BillingMode::OnDemand,
    }
}

/// Summarize a `DescribeTable` response.
pub fn table_description_to_info(table: &TableDescription) -> Result<TableInfo> {
    Ok(TableInfo {
        table_name: table.table_name().unwrap_or_default().to_string(),
        status: from_table_status(table.table_status()),
        item_count: table.item_count().unwrap_or(0),
        size_bytes: table.table_size_bytes().unwrap_or(0),
        created_at: table.creation_date_time().and_then(to_chrono),
        billing_mode: billing_mode_of(table),
        key_schema: key_schema_of(table)?,
        arn: table.table_arn().map(str::to_string),
        id: table.table_id().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::{BillingModeSummary, ProvisionedThroughputDescription};

    fn element(name: &str, key_type: KeyType) -> KeySchemaElement {
        KeySchemaElement::builder()
            .attribute_name(name)
            .key_type(key_type)
            .build()
            .unwrap()
    }

    #[test]
    fn test_key_schema_parts_with_sort_key() {
        let definition = TableDefinition::new("user_logs")
            .with_partition_key("user_id", AttributeType::String)
            .with_sort_key("ts", AttributeType::Number);

        let (schema, attributes) = key_schema_parts(&definition).unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].attribute_name(), "user_id");
        assert_eq!(schema[0].key_type(), &KeyType::Hash);
        assert_eq!(schema[1].key_type(), &KeyType::Range);
        assert_eq!(attributes[1].attribute_type(), &ScalarAttributeType::N);
    }

    #[test]
    fn test_billing_parts() {
        let (mode, throughput) = billing_parts(&BillingMode::OnDemand).unwrap();
        assert_eq!(mode, AwsBillingMode::PayPerRequest);
        assert!(throughput.is_none());

        let definition = TableDefinition::new("t").provisioned(5, 10);
        let (mode, throughput) = billing_parts(&definition.billing_mode).unwrap();
        let throughput = throughput.unwrap();
        assert_eq!(mode, AwsBillingMode::Provisioned);
        assert_eq!(throughput.read_capacity_units(), 5);
        assert_eq!(throughput.write_capacity_units(), 10);
    }

    #[test]
    fn test_table_description_to_info() {
        let description = TableDescription::builder()
            .table_name("users")
            .table_status(AwsTableStatus::Creating)
            .item_count(3)
            .table_size_bytes(120)
            .creation_date_time(AwsDateTime::from_secs(1_700_000_000))
            .key_schema(element("PK", KeyType::Hash))
            .key_schema(element("SK", KeyType::Range))
            .billing_mode_summary(
                BillingModeSummary::builder()
                    .billing_mode(AwsBillingMode::PayPerRequest)
                    .build(),
            )
            .build();

        let info = table_description_to_info(&description).unwrap();

        assert_eq!(info.table_name, "users");
        assert_eq!(info.status, TableStatus::Creating);
        assert_eq!(info.item_count, 3);
        assert_eq!(info.key_schema, KeySchema::default());
        assert_eq!(info.billing_mode, BillingMode::OnDemand);
        assert_eq!(info.created_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_provisioned_description() {
        let description = TableDescription::builder()
            .table_name("accounts")
            .table_status(AwsTableStatus::Active)
            .key_schema(element("account_id", KeyType::Hash))
            .provisioned_throughput(
                ProvisionedThroughputDescription::builder()
                    .read_capacity_units(5)
                    .write_capacity_units(10)
                    .build(),
            )
            .build();

        let info = table_description_to_info(&description).unwrap();

        assert_eq!(info.key_schema, KeySchema::new("account_id", None));
        assert_eq!(
            info.billing_mode,
            BillingMode::Provisioned(Throughput {
                read_capacity_units: 5,
                write_capacity_units: 10
            })
        );
    }

    #[test]
    fn test_missing_partition_key_is_invalid() {
        let description = TableDescription::builder().table_name("broken").build();
        assert!(matches!(
            table_description_to_info(&description),
            Err(StoreError::InvalidData(_))
        ));
    }
}
