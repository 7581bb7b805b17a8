//! PubMed MCP Server - Entry Point
//!
//! Provides both stdio and HTTP transports.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pubmed_mcp::{PubMedClient, config::Config, server::McpServer};

#[derive(Parser, Debug)]
#[command(name = "pubmed-mcp")]
#[command(about = "MCP server for PubMed search and retrieval")]
#[command(version)]
struct Cli {
    /// NCBI API key (optional, raises the rate limit to 10 req/s)
    #[arg(long, env = "NCBI_API_KEY")]
    api_key: Option<String>,

    /// Contact e-mail sent to NCBI with each request
    #[arg(long, env = "NCBI_EMAIL")]
    email: Option<String>,

    /// Tool name sent to NCBI with each request
    #[arg(long, env = "NCBI_TOOL")]
    tool_name: Option<String>,

    /// E-utilities base URL (for proxies and mirrors)
    #[arg(long, env = "NCBI_EUTILS_URL")]
    eutils_url: Option<String>,

    /// Transport mode: stdio or http
    #[arg(long, default_value = "stdio")]
    transport: Transport,

    /// HTTP server port (only used with --transport http)
    #[arg(long, default_value = "8000", env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Transport {
    /// Standard input/output
    #[default]
    Stdio,
    /// Streamable HTTP (JSON responses)
    Http,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // stderr keeps stdout free for the stdio transport
    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = ?cli.transport,
        "Starting PubMed MCP server"
    );

    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let mut config = Config::new(non_empty(cli.api_key), non_empty(cli.email));
    if let Some(tool_name) = non_empty(cli.tool_name) {
        config = config.with_tool_name(tool_name);
    }
    if let Some(url) = non_empty(cli.eutils_url) {
        config = config.with_eutils_url(url);
    }
    config.validate()?;

    let client = PubMedClient::new(config)?;
    let server = McpServer::new(client);

    match cli.transport {
        Transport::Stdio => {
            tracing::info!("Running in stdio mode");
            server.run_stdio().await?;
        }
        Transport::Http => {
            tracing::info!(port = cli.port, "Running in HTTP mode");
            server.run_http(cli.port).await?;
        }
    }

    Ok(())
}
