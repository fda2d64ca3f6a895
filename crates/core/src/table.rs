//! Table configuration types (pure data).

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::key::{KeySchema, PRIMARY_KEY};

/// Scalar attribute types allowed for key attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
    Binary,
}

impl AttributeType {
    /// DynamoDB type descriptor (`S`, `N`, `B`).
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "S" | "STRING" => Some(AttributeType::String),
            "N" | "NUMBER" => Some(AttributeType::Number),
            "B" | "BINARY" => Some(AttributeType::Binary),
            _ => None,
        }
    }
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::String)
    }
}

/// Provisioned read/write capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// Billing mode for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillingMode {
    #[default]
    OnDemand,
    Provisioned(Throughput),
}

/// Everything needed to create a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub billing_mode: BillingMode,
    /// Create the table when it is missing.
    pub create: bool,
}

impl TableDefinition {
    /// On-demand table keyed by a string `PK`, created when missing.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: KeyAttribute::string(PRIMARY_KEY),
            sort_key: None,
            billing_mode: BillingMode::OnDemand,
            create: true,
        }
    }

    pub fn with_partition_key(mut self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.partition_key = KeyAttribute::new(name, attribute_type);
        self
    }

    pub fn with_sort_key(mut self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.sort_key = Some(KeyAttribute::new(name, attribute_type));
        self
    }

    pub fn on_demand(mut self) -> Self {
        self.billing_mode = BillingMode::OnDemand;
        self
    }

    pub fn provisioned(mut self, read_capacity_units: i64, write_capacity_units: i64) -> Self {
        self.billing_mode = BillingMode::Provisioned(Throughput {
            read_capacity_units,
            write_capacity_units,
        });
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn key_schema(&self) -> KeySchema {
        KeySchema::new(
            self.partition_key.name.clone(),
            self.sort_key.as_ref().map(|k| k.name.clone()),
        )
    }
}

/// Table status as reported by `DescribeTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Updating,
    Deleting,
    Active,
    Archiving,
    Archived,
    Inaccessible,
    Unknown,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Creating => "CREATING",
            TableStatus::Updating => "UPDATING",
            TableStatus::Deleting => "DELETING",
            TableStatus::Active => "ACTIVE",
            TableStatus::Archiving => "ARCHIVING",
            TableStatus::Archived => "ARCHIVED",
            TableStatus::Inaccessible => "INACCESSIBLE_ENCRYPTION_CREDENTIALS",
            TableStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Summary of a table's description.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub table_name: String,
    pub status: TableStatus,
    pub item_count: i64,
    pub size_bytes: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub billing_mode: BillingMode,
    pub key_schema: KeySchema,
    pub arn: Option<String>,
    pub id: Option<String>,
}

/// Bounded polling policy for waits and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// No waiting between attempts. Useful against in-memory backends.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Sleep between attempts. Returns at once after the last attempt.
    pub async fn backoff(&self, attempt: u32) {
        if attempt < self.max_attempts {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_definition() {
        let table = TableDefinition::new("users");

        assert_eq!(table.partition_key, KeyAttribute::string("PK"));
        assert_eq!(table.sort_key, None);
        assert_eq!(table.billing_mode, BillingMode::OnDemand);
        assert!(table.create);
    }

    #[test]
    fn test_builder_and_key_schema() {
        let table = TableDefinition::new("user_logs")
            .with_sort_key("SK", AttributeType::String)
            .provisioned(5, 10)
            .create_if_missing(false);

        assert_eq!(
            table.billing_mode,
            BillingMode::Provisioned(Throughput {
                read_capacity_units: 5,
                write_capacity_units: 10
            })
        );
        assert!(!table.create);
        assert_eq!(
            table.key_schema(),
            KeySchema::new("PK", Some("SK".to_string()))
        );
    }

    #[test]
    fn test_attribute_type_parse() {
        assert_eq!(AttributeType::parse("s"), Some(AttributeType::String));
        assert_eq!(AttributeType::parse("Number"), Some(AttributeType::Number));
        assert_eq!(AttributeType::parse("x"), None);
        assert_eq!(AttributeType::Binary.as_str(), "B");
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_backoff_skips_sleep_after_last_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_secs(60));

        let last = tokio::time::timeout(Duration::from_secs(1), policy.backoff(2)).await;
        assert!(last.is_ok());

        let earlier = tokio::time::timeout(Duration::from_millis(50), policy.backoff(1)).await;
        assert!(earlier.is_err());
    }
}
