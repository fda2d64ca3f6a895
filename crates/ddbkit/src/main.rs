mod commands;
mod prelude;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ddbkit::{Config, DdbClient};

/// ddbkit - Manage DynamoDB tables and items from the command line
#[derive(Debug, Parser)]
#[command(name = "ddbkit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: Global,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Custom DynamoDB endpoint, e.g. http://localhost:8000 for DynamoDB Local
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Silence status output
    #[arg(long, global = true)]
    pub silent: bool,
}

impl Global {
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    fn config(&self) -> Config {
        let config = Config::from_env().with_region(&self.region);
        match &self.endpoint_url {
            Some(endpoint) => config.with_endpoint(endpoint),
            None => config,
        }
    }
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Manage tables
    Table(commands::table::TableCommand),

    /// Read and write items
    Item(commands::item::ItemCommand),
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ddbkit=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.global.log_json);

    let config = cli.global.config();
    tracing::debug!(
        region = %config.region,
        endpoint = ?config.endpoint_url,
        "connecting to DynamoDB"
    );
    let client = DdbClient::from_config(&config).await;

    match cli.command {
        Commands::Table(table_cmd) => {
            commands::table::run(table_cmd, client, &cli.global).await?;
        }
        Commands::Item(item_cmd) => {
            commands::item::run(item_cmd, client, &cli.global).await?;
        }
    }

    Ok(())
}
