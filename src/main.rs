//! `prompt-studio` -- host process for the prompt editor backend.
//!
//! Speaks JSON lines on stdio. Each stdin line is a request
//! `{"id": <any>, "command": "create_prompt", "args": {...}}`; each reply is
//! written to stdout as `{"id": <same>, "response": <CommandResponse>}`.
//! Events raised while streams run are written as
//! `{"event": "...", "payload": ...}` lines. Logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable             | Default            | Description                      |
//! |----------------------|--------------------|----------------------------------|
//! | `PROMPT_STUDIO_HOME` | `~/.prompt-studio` | Data directory (config, database)|
//! | `RUST_LOG`           | config `logFilter` | tracing filter                   |

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prompt_studio::models::settings::AppConfig;
use prompt_studio::storage::ConfigService;
use prompt_studio::{dispatch, is_long_running, AppState};

/// How long to wait for running commands, then for pending output, at shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    command: String,
    #[serde(default)]
    args: Value,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn handle(state: &AppState, request: Request, out: &mpsc::UnboundedSender<Value>) {
    let response = dispatch(state, &request.command, request.args).await;
    let _ = out.send(json!({ "id": request.id, "response": response }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_error) = match ConfigService::new() {
        Ok(service) => (service.get_config().clone(), None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_tracing(&config.log_filter);
    if let Some(e) = config_error {
        tracing::warn!("[Config] using defaults: {}", e);
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let state = AppState::initialize(config)
        .context("failed to open prompt storage")?
        .with_events(events_tx);

    let (out, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(value) = out_rx.recv().await {
            let mut line = value.to_string();
            line.push('\n');
            if let Err(e) = stdout.write_all(line.as_bytes()).await {
                tracing::error!("stdout closed: {}", e);
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let event_out = out.clone();
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match serde_json::to_value(&event) {
                Ok(value) => {
                    let _ = event_out.send(value);
                }
                Err(e) => tracing::warn!("failed to serialize event: {}", e),
            }
        }
    });

    tracing::info!("prompt-studio ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("malformed request: {}", e);
                let _ = out.send(json!({
                    "id": null,
                    "response": { "success": false, "data": null, "error": format!("Malformed request: {}", e) },
                }));
                continue;
            }
        };

        if is_long_running(&request.command) {
            let out = out.clone();
            let task_state = state.clone();
            state.spawn(async move { handle(&task_state, request, &out).await });
        } else {
            handle(&state, request, &out).await;
        }
    }

    tracing::info!("stdin closed, shutting down");
    state.shutdown(SHUTDOWN_GRACE).await;
    drop(state);
    drop(out);
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, writer).await;
    Ok(())
}
