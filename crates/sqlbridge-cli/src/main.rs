use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlbridge_core::config::SqlbridgeConfig;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{call::CallArgs, chat::ChatArgs, serve::ServeArgs, tools::ToolsArgs};

const DEFAULT_CONFIG: &str = "sqlbridge.toml";

#[derive(Parser, Debug)]
#[command(name = "sqlbridge", version, about = "Database tools over MCP")]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true, env = "SQLBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the MCP server over a Postgres database.
    Serve(ServeArgs),

    /// List the tools a running server exposes.
    Tools(ToolsArgs),

    /// Invoke one tool on a running server and print the result.
    Call(CallArgs),

    /// Chat with a model that can call the server's tools.
    Chat(ChatArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // stdout belongs to the stdio transport and to command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Serve(args) => commands::serve::execute(config, args).await,
        Command::Tools(args) => commands::tools::execute(config, args).await,
        Command::Call(args) => commands::call::execute(config, args).await,
        Command::Chat(args) => commands::chat::execute(config, args).await,
    }
}

/// Load the config file. An explicit path must exist; the default
/// `sqlbridge.toml` is optional.
fn load_config(path: Option<&Path>) -> Result<SqlbridgeConfig> {
    match path {
        Some(path) => SqlbridgeConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path)),
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if default.exists() {
                SqlbridgeConfig::load_from_path(default)
                    .with_context(|| format!("Failed to load configuration from {:?}", default))
            } else {
                warn!(config = DEFAULT_CONFIG, "Config file not found, using defaults");
                Ok(SqlbridgeConfig::default())
            }
        }
    }
}
