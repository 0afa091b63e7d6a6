//! `sqlbridge chat` - interactive chat with tool access.

use anyhow::{Context, Result};
use clap::Args;
use sqlbridge_client::{OpenAiProvider, Orchestrator, OrchestratorConfig};
use sqlbridge_core::config::{ClientConfig, SqlbridgeConfig};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Arguments for `sqlbridge chat`.
#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Server base URL. Overrides config file.
    #[arg(long)]
    pub server: Option<String>,

    /// Chat model name. Overrides config file.
    #[arg(long)]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL. Overrides config file.
    #[arg(long)]
    pub api_base: Option<String>,

    /// Tool-proposing rounds per message. Overrides config file.
    #[arg(long)]
    pub max_tool_rounds: Option<usize>,
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    Reset,
    Tools,
    Quit,
    Empty,
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Input::Empty,
            "/reset" => Input::Reset,
            "/tools" => Input::Tools,
            "/exit" | "/quit" => Input::Quit,
            text => Input::Message(text),
        }
    }
}

pub async fn execute(config: SqlbridgeConfig, args: ChatArgs) -> Result<()> {
    let client_config = apply_overrides(config.client, &args);

    let api_key = std::env::var(&client_config.api_key_env).with_context(|| {
        format!(
            "No API key. Export {} (or set client.api_key_env)",
            client_config.api_key_env
        )
    })?;
    let llm = Arc::new(OpenAiProvider::new(
        &client_config.api_base,
        api_key,
        client_config.model.clone(),
    ));

    let client = Arc::new(super::connect(None, &client_config.server_url).await?);
    let mut orchestrator =
        Orchestrator::load(llm, client, OrchestratorConfig::from(&client_config)).await?;

    info!(
        model = %client_config.model,
        tools = orchestrator.catalog().len(),
        "Chat ready"
    );
    println!("Type a message. /tools lists tools, /reset clears history, /exit quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Input::parse(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Reset => {
                orchestrator.reset();
                println!("(conversation cleared)");
            }
            Input::Tools => {
                for tool in orchestrator.catalog() {
                    println!("  {} - {}", tool.name, tool.description);
                }
            }
            Input::Message(text) => match orchestrator.submit(text).await {
                Ok(answer) => println!("assistant> {}\n", answer),
                Err(e) => error!(error = %e, "Chat turn failed"),
            },
        }
    }

    Ok(())
}

fn apply_overrides(mut config: ClientConfig, args: &ChatArgs) -> ClientConfig {
    if let Some(server) = &args.server {
        config.server_url = server.clone();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(api_base) = &args.api_base {
        config.api_base = api_base.clone();
    }
    if let Some(rounds) = args.max_tool_rounds {
        config.max_tool_rounds = rounds;
    }
    config
}
