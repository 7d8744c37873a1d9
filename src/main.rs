//! TM1 Agency
//!
//! Serves TM1 tools over a JSON-lines protocol on stdin/stdout:
//! - one `ToolCall` per input line, each run as its own task
//! - one `{"name", "id", "output"}` object per output line
//! - `{"name": "list_tools"}` returns the tool catalog

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tm1_agency::{Tm1Client, Tm1Config, ToolCall, ToolOutput, ToolRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Logs go to stderr; stdout carries tool results
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tm1_agency=info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Tm1Config::load().context("Failed to load TM1 configuration")?;
    let concurrency = config.validation_concurrency;
    let client = Arc::new(
        Tm1Client::connect(config)
            .await
            .context("Failed to connect to TM1 server")?,
    );

    let tools = Arc::new(ToolRegistry::new());
    tools.register_backend(client.clone(), concurrency).await;
    info!("Tools: {}", tools.tool_names().await.join(", "));

    let stdout = Arc::new(Mutex::new(tokio::io::stdout()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let tools = tools.clone();
        let stdout = stdout.clone();
        in_flight.spawn(async move {
            let reply = handle_line(&tools, &line).await;
            if let Err(e) = write_reply(&stdout, &reply).await {
                warn!("Failed to write reply: {}", e);
            }
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            warn!("Tool task aborted: {}", e);
        }
    }

    if let Err(e) = client.close().await {
        warn!("Failed to close TM1 session: {}", e);
    }
    Ok(())
}

async fn handle_line(tools: &ToolRegistry, line: &str) -> Value {
    let call: ToolCall = match serde_json::from_str(line) {
        Ok(call) => call,
        Err(e) => {
            let output = ToolOutput::failure(format!("Malformed tool call: {}", e));
            return json!({ "name": Value::Null, "id": Value::Null, "output": output });
        }
    };

    let output = if call.name == "list_tools" {
        let catalog = tools.catalog().await;
        let count = catalog.as_array().map(Vec::len).unwrap_or(0);
        ToolOutput::success(catalog, format!("{} tool(s) available", count))
    } else {
        match tools.execute(&call).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                ToolOutput::failure(e.to_string())
            }
        }
    };

    json!({ "name": call.name, "id": call.id, "output": output })
}

async fn write_reply(stdout: &Mutex<Stdout>, reply: &Value) -> Result<()> {
    let mut line = serde_json::to_string(reply)?;
    line.push('\n');

    let mut out = stdout.lock().await;
    out.write_all(line.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}
