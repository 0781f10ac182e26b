mod console;
mod operator;

use std::{io::BufRead, path::PathBuf, thread};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    config::{load_settings, load_settings_from},
    session_queue, EffectPolicy, Session, SessionHandle, WsChannel,
};
use tracing::{info, warn};

use crate::{
    console::Console,
    operator::{parse_command, Command, CommandError},
};

#[derive(Parser, Debug)]
#[command(about = "Operator console for a remotely controlled surface")]
struct Args {
    /// Websocket endpoint of the controller, e.g. ws://127.0.0.1:8001/ws_gui
    #[arg(long)]
    endpoint: Option<String>,
    /// Settings file (defaults to ./surface.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// independent | latest-wins
    #[arg(long)]
    effect_policy: Option<EffectPolicy>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => load_settings_from(path, |name| std::env::var(name).ok()),
        None => load_settings(),
    };
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(policy) = args.effect_policy {
        settings.effect_policy = policy;
    }

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| settings.log_filter.clone());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let endpoint = settings
        .endpoint_url()
        .with_context(|| format!("invalid endpoint '{}'", settings.endpoint))?;
    info!(%endpoint, "desktop: connecting");

    let (handle, queue) = session_queue();
    let channel = match WsChannel::connect(&endpoint, handle.channel_sink()).await {
        Ok(channel) => channel,
        Err(err) => {
            warn!(%err, "desktop: continuing without a connection");
            WsChannel::disconnected()
        }
    };

    spawn_operator_input(handle.clone());

    let mut console = Console::default();
    let session = Session::new(channel, settings.engine_config(), &handle, queue);
    let engine = session.run_with(|engine| console.refresh(engine)).await;

    info!(entries = engine.log().len(), "desktop: session ended");
    Ok(())
}

/// Reads operator commands from stdin on a plain thread so a pending read
/// never holds the runtime open at exit.
fn spawn_operator_input(handle: SessionHandle) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(%err, "desktop: stdin read failed");
                    break;
                }
            };
            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(Command::Operator(event)) => {
                    if !handle.operator(event) {
                        return;
                    }
                }
                Err(CommandError::Empty) => {}
                Err(err) => eprintln!("{err}"),
            }
        }
        handle.shutdown();
    });
}
