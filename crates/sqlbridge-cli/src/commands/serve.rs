//! `sqlbridge serve` - run the MCP server over a Postgres database.

use anyhow::{Context, Result};
use clap::Args;
use sqlbridge_adapter_pg::PostgresDatabase;
use sqlbridge_core::config::{SqlbridgeConfig, Transport};
use sqlbridge_mcp::{McpServer, ToolExecutor};
use std::sync::Arc;
use tracing::info;

/// Arguments for `sqlbridge serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Transport type (sse or stdio). Overrides config file.
    #[arg(long)]
    pub transport: Option<String>,

    /// Bind host (only for sse). Overrides config file.
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port (only for sse). Overrides config file.
    #[arg(long)]
    pub port: Option<u16>,

    /// Postgres connection URL. Overrides config file and environment.
    #[arg(long)]
    pub database_url: Option<String>,
}

pub async fn execute(mut config: SqlbridgeConfig, args: ServeArgs) -> Result<()> {
    apply_overrides(&mut config, &args)?;

    let database_url = config.database.resolve_url().with_context(|| {
        format!(
            "No database URL. Set database.url in the config file, export {}, or pass --database-url",
            config.database.url_env
        )
    })?;

    let database = PostgresDatabase::connect(&database_url, config.database.max_connections)
        .await
        .context("Failed to connect to the database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let executor = ToolExecutor::with_builtin_tools(Arc::new(database));
    let server = Arc::new(McpServer::new(config.server, executor));

    server.run(shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

/// Fold command-line flags into the loaded configuration.
fn apply_overrides(config: &mut SqlbridgeConfig, args: &ServeArgs) -> Result<()> {
    if let Some(raw) = &args.transport {
        config.server.transport = raw
            .parse::<Transport>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = &args.database_url {
        config.database.url = Some(url.clone());
    }
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
