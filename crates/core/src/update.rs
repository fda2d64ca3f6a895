//! Partial update expressions.
//!
//! Builds `SET` expressions with name/value placeholders so attribute names
//! never collide with DynamoDB reserved words.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::codec::Item;
use crate::error::{Result, StoreError};
use crate::key::KeySchema;

/// A `SET` update with its placeholder maps.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
    changes: Item,
    partition_key: String,
}

const PARTITION_PLACEHOLDER: &str = "#pk";

impl UpdatePlan {
    /// Build a plan that sets every attribute in `changes`.
    ///
    /// Fields are assigned placeholders in sorted order, so the expression
    /// is stable for a given change set.
    pub fn from_item(changes: &Item, schema: &KeySchema) -> Result<Self> {
        if changes.is_empty() {
            return Err(StoreError::InvalidUpdate(
                "no attributes to update".to_string(),
            ));
        }

        let mut fields: Vec<&String> = changes.keys().collect();
        fields.sort();

        if let Some(key_field) = fields.iter().find(|f| schema.is_key_attribute(f)) {
            return Err(StoreError::InvalidUpdate(format!(
                "key attribute {key_field} cannot be updated"
            )));
        }

        let mut names = HashMap::with_capacity(fields.len() + 1);
        let mut values = HashMap::with_capacity(fields.len());
        let mut assignments = Vec::with_capacity(fields.len());

        for (i, field) in fields.iter().enumerate() {
            let name = format!("#f{i}");
            let value = format!(":v{i}");
            assignments.push(format!("{name} = {value}"));
            names.insert(name, (*field).clone());
            values.insert(value, changes[*field].clone());
        }
        names.insert(
            PARTITION_PLACEHOLDER.to_string(),
            schema.partition.clone(),
        );

        Ok(Self {
            expression: format!("SET {}", assignments.join(", ")),
            names,
            values,
            changes: changes.clone(),
            partition_key: schema.partition.clone(),
        })
    }

    /// Condition that makes the update fail when the item does not exist.
    pub fn condition(&self) -> String {
        format!("attribute_exists({PARTITION_PLACEHOLDER})")
    }

    /// Apply the same `SET` semantics to a stored item.
    pub fn apply(&self, item: &mut Item) {
        debug_assert!(item.contains_key(&self.partition_key));
        for (field, value) in &self.changes {
            item.insert(field.clone(), value.clone());
        }
    }
}
