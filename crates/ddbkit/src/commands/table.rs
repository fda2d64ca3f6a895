//! Table administration commands.

use dialoguer::Confirm;

use ddbkit::DdbClient;
use ddbkit_core::{AttributeType, BillingMode, TableDefinition, TableInfo};

use super::{CommandError, Result};
use crate::prelude::*;
use crate::Global;

/// Create, inspect and delete tables.
#[derive(Debug, clap::Parser)]
pub struct TableCommand {
    #[command(subcommand)]
    pub action: TableAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum TableAction {
    /// Create a table and wait until it is active.
    Create(CreateArgs),

    /// List table names.
    List,

    /// Show a table's status, key schema and billing mode.
    Describe {
        /// Table name.
        name: String,
    },

    /// Delete a table and all of its items.
    Drop {
        /// Table name.
        name: String,

        /// Skip confirmation prompts.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    /// Table name.
    pub name: String,

    /// Partition key attribute name.
    #[arg(long, default_value = "PK")]
    pub partition_key: String,

    /// Partition key type (S, N or B).
    #[arg(long, default_value = "S")]
    pub partition_type: String,

    /// Sort key attribute name.
    #[arg(long)]
    pub sort_key: Option<String>,

    /// Sort key type (S, N or B).
    #[arg(long, default_value = "S")]
    pub sort_type: String,

    /// Provisioned read capacity. Tables are on-demand when omitted.
    #[arg(long, requires = "write_capacity")]
    pub read_capacity: Option<i64>,

    /// Provisioned write capacity.
    #[arg(long, requires = "read_capacity")]
    pub write_capacity: Option<i64>,
}

fn attribute_type(raw: &str) -> Result<AttributeType> {
    AttributeType::parse(raw).ok_or_else(|| CommandError::UnknownAttributeType(raw.to_string()))
}

impl CreateArgs {
    pub fn to_definition(&self) -> Result<TableDefinition> {
        let mut definition = TableDefinition::new(&self.name)
            .with_partition_key(&self.partition_key, attribute_type(&self.partition_type)?);

        if let Some(sort_key) = &self.sort_key {
            definition = definition.with_sort_key(sort_key, attribute_type(&self.sort_type)?);
        }

        if let (Some(read), Some(write)) = (self.read_capacity, self.write_capacity) {
            definition = definition.provisioned(read, write);
        }

        Ok(definition)
    }
}

pub async fn run(command: TableCommand, client: DdbClient, global: &Global) -> Result<()> {
    match command.action {
        TableAction::Create(args) => {
            let definition = args.to_definition()?;
            let client = client.add_table(definition);
            client.start().await?;
            if !global.is_silent() {
                aprintln!("{} {}", p_g("Created table"), args.name);
            }
        }
        TableAction::List => {
            for name in client.list_tables().await? {
                aprintln!("{name}");
            }
        }
        TableAction::Describe { name } => {
            let info = client.describe_table(&name).await?;
            for line in format_table_info(&info) {
                aprintln!("{line}");
            }
        }
        TableAction::Drop { name, force } => {
            if !force {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to delete {name}? ALL DATA WILL BE LOST"
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| CommandError::Prompt(e.to_string()))?;

                if !confirmed {
                    return Err(CommandError::UserCancelled);
                }
            }

            client.drop_table(&name).await?;
            if !global.is_silent() {
                aprintln!("{} {}", p_r("Deleted table"), name);
            }
        }
    }

    Ok(())
}

fn format_billing(billing_mode: &BillingMode) -> String {
    match billing_mode {
        BillingMode::OnDemand => "on-demand".to_string(),
        BillingMode::Provisioned(t) => format!(
            "provisioned ({} RCU / {} WCU)",
            t.read_capacity_units, t.write_capacity_units
        ),
    }
}

fn format_table_info(info: &TableInfo) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", p_b("Table:"), info.table_name),
        format!("{} {}", p_b("Status:"), p_y(info.status.as_str())),
        format!("{} {}", p_b("Partition key:"), info.key_schema.partition),
    ];
    if let Some(sort) = &info.key_schema.sort {
        lines.push(format!("{} {}", p_b("Sort key:"), sort));
    }
    lines.push(format!("{} {}", p_b("Billing:"), format_billing(&info.billing_mode)));
    lines.push(format!("{} {}", p_b("Items:"), info.item_count));
    lines.push(format!("{} {}", p_b("Size (bytes):"), info.size_bytes));
    if let Some(created_at) = info.created_at {
        lines.push(format!("{} {}", p_b("Created:"), created_at.to_rfc3339()));
    }
    if let Some(arn) = &info.arn {
        lines.push(format!("{} {}", p_b("ARN:"), arn));
    }
    lines
}
