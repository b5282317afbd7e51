//! Jira MCP server binary.
//!
//! Runs the MCP server over stdio. Logs go to stderr so they never mix with
//! protocol traffic on stdout.

use clap::{Parser, ValueEnum};
use jira_api::HttpConnector;
use jira_mcp::JiraMcpServer;
use jira_mcp::config::{ServerConfig, resolve_home};
use jira_workspace::WorkspaceStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// MCP server for Jira Cloud and Server/Data Center.
#[derive(Parser, Debug)]
#[command(name = "jira-mcp", version, about)]
struct Args {
    /// Directory holding workspace profiles and config.yaml
    #[arg(long, env = "JIRA_MCP_HOME")]
    home: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,

    /// Transport to serve on
    #[arg(long, value_enum, default_value = "stdio")]
    transport: Transport,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Transport {
    Stdio,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG overrides --debug.
    let default_filter = if args.debug {
        "jira_mcp=debug,jira_workspace=debug,jira_api=debug"
    } else {
        "jira_mcp=info,jira_workspace=info,jira_api=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let home = resolve_home(args.home)?;
    let config = ServerConfig::load_or_default(&home).await?;
    let store = Arc::new(WorkspaceStore::open(&home).await?);
    let connector = Arc::new(HttpConnector::new(config.request_timeout()));

    tracing::info!(
        home = %home.display(),
        transport = ?args.transport,
        server = %config.server_name,
        "Starting jira-mcp server"
    );

    let server = JiraMcpServer::new(store, connector, config);
    match args.transport {
        Transport::Stdio => server.run().await?,
    }

    tracing::info!("jira-mcp server stopped");
    Ok(())
}
