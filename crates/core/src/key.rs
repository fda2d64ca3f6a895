//! Primary keys.
//!
//! Pure helpers for building and matching partition/sort keys.

use std::fmt;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::codec::Item;
use crate::table::AttributeType;

/// Conventional partition key attribute name.
pub const PRIMARY_KEY: &str = "PK";

/// Conventional sort key attribute name.
pub const SORT_KEY: &str = "SK";

/// A scalar key value. Key attributes can only be strings, numbers or binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    S(String),
    N(String),
    B(Vec<u8>),
}

impl KeyValue {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            KeyValue::S(_) => AttributeType::String,
            KeyValue::N(_) => AttributeType::Number,
            KeyValue::B(_) => AttributeType::Binary,
        }
    }

    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            KeyValue::S(s) => AttributeValue::S(s.clone()),
            KeyValue::N(n) => AttributeValue::N(n.clone()),
            KeyValue::B(b) => AttributeValue::B(Blob::new(b.clone())),
        }
    }

    /// Extract a key value from an attribute. Non-scalar attributes yield `None`.
    pub fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::S(s) => Some(KeyValue::S(s.clone())),
            AttributeValue::N(n) => Some(KeyValue::N(n.clone())),
            AttributeValue::B(b) => Some(KeyValue::B(b.as_ref().to_vec())),
            _ => None,
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::S(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::S(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::N(value.to_string())
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::S(s) | KeyValue::N(s) => write!(f, "{s}"),
            KeyValue::B(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// The primary key of a single item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub partition: (String, KeyValue),
    pub sort: Option<(String, KeyValue)>,
}

impl Key {
    /// Key with only a partition component.
    pub fn partition(name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        Self {
            partition: (name.into(), value.into()),
            sort: None,
        }
    }

    /// Adds a sort component.
    pub fn with_sort(mut self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.sort = Some((name.into(), value.into()));
        self
    }

    /// Partition key on the conventional `PK` attribute.
    pub fn pk(value: impl Into<KeyValue>) -> Self {
        Self::partition(PRIMARY_KEY, value)
    }

    /// Composite key on the conventional `PK`/`SK` attributes.
    pub fn pk_sk(pk: impl Into<KeyValue>, sk: impl Into<KeyValue>) -> Self {
        Self::pk(pk).with_sort(SORT_KEY, sk)
    }

    /// Key attributes as an item, ready for `GetItem`/`DeleteItem`.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(
            self.partition.0.clone(),
            self.partition.1.to_attribute_value(),
        );
        if let Some((name, value)) = &self.sort {
            item.insert(name.clone(), value.to_attribute_value());
        }
        item
    }

    /// Whether the item carries exactly these key values.
    pub fn matches(&self, item: &Item) -> bool {
        let component_matches = |(name, value): &(String, KeyValue)| {
            item.get(name)
                .and_then(KeyValue::from_attribute_value)
                .is_some_and(|v| &v == value)
        };
        component_matches(&self.partition) && self.sort.as_ref().is_none_or(component_matches)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.partition.0, self.partition.1)?;
        if let Some((name, value)) = &self.sort {
            write!(f, ",{name}={value}")?;
        }
        Ok(())
    }
}

/// Names of a table's key attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub partition: String,
    pub sort: Option<String>,
}

impl KeySchema {
    pub fn new(partition: impl Into<String>, sort: Option<String>) -> Self {
        Self {
            partition: partition.into(),
            sort,
        }
    }

    /// Extract the key of a stored item. `None` when a key attribute is
    /// missing or not a scalar.
    pub fn key_of(&self, item: &Item) -> Option<Key> {
        let partition = KeyValue::from_attribute_value(item.get(&self.partition)?)?;
        let mut key = Key::partition(self.partition.clone(), partition);
        if let Some(sort_name) = &self.sort {
            let sort = KeyValue::from_attribute_value(item.get(sort_name)?)?;
            key = key.with_sort(sort_name.clone(), sort);
        }
        Some(key)
    }

    /// Whether `name` is one of the key attributes.
    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.partition == name || self.sort.as_deref() == Some(name)
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::new(PRIMARY_KEY, Some(SORT_KEY.to_string()))
    }
}
