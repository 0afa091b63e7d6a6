//! `sqlbridge call` - invoke one tool by hand.
//!
//! Arguments are checked against the tool's input schema before anything is
//! sent, the same way the server checks them.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use sqlbridge_client::{ToolClient, render_result};
use sqlbridge_core::config::SqlbridgeConfig;
use sqlbridge_core::validate_arguments;
use tracing::warn;

/// Arguments for `sqlbridge call`.
#[derive(Debug, Args)]
pub struct CallArgs {
    /// Tool name.
    pub tool: String,

    /// Arguments as a JSON object.
    #[arg(long)]
    pub json: Option<String>,

    /// One argument as `name=value`. Repeatable; applied after `--json`.
    #[arg(long)]
    pub arg: Vec<String>,

    /// Server base URL. Overrides config file.
    #[arg(long)]
    pub server: Option<String>,
}

pub async fn execute(config: SqlbridgeConfig, args: CallArgs) -> Result<()> {
    let raw = collect_arguments(args.json.as_deref(), &args.arg)?;

    let client = super::connect(args.server.as_deref(), &config.client.server_url).await?;
    let tools = client.list_tools().await?;
    let descriptor = super::tools::find_tool(&tools, &args.tool)?;

    let validated = validate_arguments(descriptor, &raw)?;

    let result = client
        .call_tool(&descriptor.name, validated.to_json())
        .await
        .with_context(|| format!("Tool call failed: {}", descriptor.name))?;

    println!("{}", render_result(&result));

    if result.is_error {
        warn!(tool = %descriptor.name, "Tool reported an error");
        anyhow::bail!("Tool {} reported an error", descriptor.name);
    }
    Ok(())
}

/// Merge `--json` and `--arg` values into one argument object.
///
/// `--arg` values stay strings; array-typed fields are coerced later by the
/// validator.
fn collect_arguments(json: Option<&str>, pairs: &[String]) -> Result<Map<String, Value>> {
    let mut raw = match json {
        Some(text) => match serde_json::from_str::<Value>(text)
            .context("Failed to parse --json arguments")?
        {
            Value::Object(map) => map,
            other => anyhow::bail!("--json must be a JSON object, got: {}", other),
        },
        None => Map::new(),
    };

    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Invalid --arg '{}', expected name=value", pair))?;
        raw.insert(name.trim().to_string(), Value::String(value.to_string()));
    }

    Ok(raw)
}
