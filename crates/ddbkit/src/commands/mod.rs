//! CLI commands.

mod error;
pub mod item;
pub mod table;

pub use error::{CommandError, Result};

use serde_json::{Map, Value};

use ddbkit_core::{Key, KeySchema, KeyValue, StoreError};

/// Key values for item commands.
#[derive(Debug, Clone, clap::Args)]
pub struct KeyArgs {
    /// Partition key value.
    #[arg(long)]
    pub pk: String,

    /// Sort key value, required when the table has a sort key.
    #[arg(long)]
    pub sk: Option<String>,

    /// Send key values as numbers instead of strings.
    #[arg(long)]
    pub numeric: bool,
}

impl KeyArgs {
    fn value(&self, raw: &str) -> KeyValue {
        if self.numeric {
            KeyValue::N(raw.to_string())
        } else {
            KeyValue::S(raw.to_string())
        }
    }

    /// Build a key using the attribute names of the table.
    pub fn to_key(&self, table: &str, schema: &KeySchema) -> Result<Key> {
        let key = Key::partition(schema.partition.clone(), self.value(&self.pk));

        match (&schema.sort, &self.sk) {
            (Some(name), Some(sk)) => Ok(key.with_sort(name.clone(), self.value(sk))),
            (Some(name), None) => Err(CommandError::MissingSortKey {
                table: table.to_string(),
                name: name.clone(),
            }),
            (None, Some(_)) => Err(StoreError::InvalidData(format!(
                "table {table} has no sort key"
            ))
            .into()),
            (None, None) => Ok(key),
        }
    }
}

/// Parse a JSON object given inline, or read it from stdin when `raw` is `-`.
pub fn parse_document(raw: &str) -> Result<Map<String, Value>> {
    let text = if raw == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        raw.to_string()
    };

    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        other => Err(CommandError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
