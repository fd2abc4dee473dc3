//! MCP OAuth Gateway - Entry Point

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mcp_oauth_gateway::{
    config::{Config, ConfigArgs},
    corpus::{DocumentIndex, ProcessedDocs},
    server::Gateway,
    tools::register_all_tools,
};

#[derive(Parser, Debug)]
#[command(name = "mcp-oauth-gateway")]
#[command(about = "MCP server with an embedded OAuth 2.0 authorization server")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %cli.config.host,
        port = cli.config.port,
        "Starting MCP OAuth gateway"
    );

    let config = Config::from(cli.config);

    let index = match &config.documents_dir {
        Some(dir) => {
            let docs = ProcessedDocs::open(dir).await?;
            Some(Arc::new(docs) as Arc<dyn DocumentIndex>)
        }
        None => None,
    };

    let tools = register_all_tools(index)?;
    Gateway::new(config, tools).run_http().await
}
