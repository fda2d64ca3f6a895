//! Item commands. Documents are JSON objects, given inline or on stdin (`-`).

use serde_json::Value;

use ddbkit::DdbClient;
use ddbkit_core::Key;

use super::{parse_document, KeyArgs, Result};
use crate::prelude::*;
use crate::Global;

/// Read and write items as JSON documents.
#[derive(Debug, clap::Parser)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub action: ItemAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum ItemAction {
    /// Write an item, replacing any item with the same key.
    Put {
        table: String,
        /// JSON object, or `-` to read from stdin.
        document: String,
    },

    /// Write an item only if its key is not taken.
    Insert {
        table: String,
        /// JSON object, or `-` to read from stdin.
        document: String,
    },

    /// Print one item.
    Get {
        table: String,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Print every item in the table, one JSON document per line.
    Scan { table: String },

    /// Delete one item.
    Delete {
        table: String,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Set the given attributes on an existing item.
    Update {
        table: String,
        #[command(flatten)]
        key: KeyArgs,
        /// JSON object with the attributes to set, or `-` to read from stdin.
        document: String,
    },
}

async fn resolve_key(client: &DdbClient, table: &str, args: &KeyArgs) -> Result<Key> {
    let info = client.describe_table(table).await?;
    args.to_key(table, &info.key_schema)
}

pub async fn run(command: ItemCommand, client: DdbClient, global: &Global) -> Result<()> {
    match command.action {
        ItemAction::Put { table, document } => {
            client.put(&table, &parse_document(&document)?).await?;
            if !global.is_silent() {
                aprintln!("{} {}", p_g("Stored item in"), table);
            }
        }
        ItemAction::Insert { table, document } => {
            client.insert(&table, &parse_document(&document)?).await?;
            if !global.is_silent() {
                aprintln!("{} {}", p_g("Inserted item into"), table);
            }
        }
        ItemAction::Get { table, key } => {
            let key = resolve_key(&client, &table, &key).await?;
            match client.find_by_key::<Value>(&table, &key).await? {
                Some(item) => aprintln!("{}", serde_json::to_string_pretty(&item)?),
                None => aprintln!("{} {}", p_y("No item with key"), key),
            }
        }
        ItemAction::Scan { table } => {
            let items: Vec<Value> = client.scan_all(&table).await?;
            for item in &items {
                aprintln!("{}", serde_json::to_string(item)?);
            }
            tracing::debug!(table = %table, count = items.len(), "scan complete");
        }
        ItemAction::Delete { table, key } => {
            let key = resolve_key(&client, &table, &key).await?;
            let removed = client.delete(&table, &key).await?;
            if !global.is_silent() {
                if removed {
                    aprintln!("{} {}", p_r("Deleted"), key);
                } else {
                    aprintln!("{} {}", p_y("No item with key"), key);
                }
            }
        }
        ItemAction::Update {
            table,
            key,
            document,
        } => {
            let key = resolve_key(&client, &table, &key).await?;
            client
                .update_partial(&table, &key, &parse_document(&document)?)
                .await?;
            if !global.is_silent() {
                aprintln!("{} {}", p_g("Updated"), key);
            }
        }
    }

    Ok(())
}
