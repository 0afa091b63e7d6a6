//! Tools introspection commands.
//!
//! `sqlbridge tools` - List the tools a running server exposes.
//! `sqlbridge tools --describe <name>` - Show the input schema of one tool.

use anyhow::Result;
use clap::Args;
use sqlbridge_client::ToolClient;
use sqlbridge_core::config::SqlbridgeConfig;
use sqlbridge_core::protocol::ToolDescriptor;

/// Arguments for `sqlbridge tools`.
#[derive(Debug, Args)]
pub struct ToolsArgs {
    /// Server base URL. Overrides config file.
    #[arg(long)]
    pub server: Option<String>,

    /// Show one tool in detail.
    #[arg(long)]
    pub describe: Option<String>,

    /// Show input schemas in the listing.
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn execute(config: SqlbridgeConfig, args: ToolsArgs) -> Result<()> {
    let client = super::connect(args.server.as_deref(), &config.client.server_url).await?;
    let tools = client.list_tools().await?;

    match &args.describe {
        Some(name) => {
            let tool = find_tool(&tools, name)?;
            println!("\nTool: {}", tool.name);
            println!("\nDescription: {}", tool.description);
            println!("\nInput Schema:");
            println!("{}", serde_json::to_string_pretty(&tool.input_schema)?);
            println!();
        }
        None => {
            println!("\n🔧 Available Tools ({}):", tools.len());
            for tool in &tools {
                println!("   • {} ({})", tool.name, required_summary(tool));
                println!("     {}", tool.description);
                if args.verbose {
                    println!(
                        "     Schema: {}",
                        serde_json::to_string_pretty(&tool.input_schema)?
                    );
                }
            }
            println!();
        }
    }

    Ok(())
}

/// Look up a tool by exact name.
pub fn find_tool<'a>(tools: &'a [ToolDescriptor], name: &str) -> Result<&'a ToolDescriptor> {
    tools
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| anyhow::anyhow!("Tool not found: {}", name))
}

fn required_summary(tool: &ToolDescriptor) -> String {
    let required = tool.required_fields();
    if required.is_empty() {
        "no arguments".to_string()
    } else {
        format!("requires {}", required.join(", "))
    }
}
