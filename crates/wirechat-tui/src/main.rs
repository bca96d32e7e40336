//! Wirechat terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Connect to a local server
//! wirechat
//!
//! # Connect elsewhere, logging debug output
//! wirechat --server ws://chat.example.com:8100 --log-level debug
//! ```
//!
//! Inside the client, `/register <user> <pass>` creates an account and
//! `/connect <user> <pass>` starts a chat session.

use std::{fs::File, sync::Mutex, time::Duration};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wirechat_client::{
    ControllerConfig, DEFAULT_ENDPOINT, DEFAULT_HANDSHAKE_TIMEOUT, EchoPolicy, SystemEnv,
};
use wirechat_tui::{Runtime, TerminalDriver};

/// Wirechat terminal chat client
#[derive(Parser, Debug)]
#[command(name = "wirechat")]
#[command(about = "Terminal chat client for Wirechat servers")]
#[command(version)]
struct Args {
    /// WebSocket URL of the chat server
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    server: String,

    /// Seconds to wait for the authentication outcome
    #[arg(long, default_value_t = DEFAULT_HANDSHAKE_TIMEOUT.as_secs())]
    handshake_timeout: u64,

    /// Show own messages as soon as they are sent instead of waiting for the
    /// server broadcast
    #[arg(long)]
    local_echo: bool,

    /// File to write logs to (the terminal is taken by the UI)
    #[arg(long, default_value = "wirechat.log")]
    log_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let log_file = File::create(&args.log_file)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(log_file)).with_ansi(false))
        .with(filter)
        .init();

    let config = ControllerConfig {
        endpoint: args.server,
        handshake_timeout: Duration::from_secs(args.handshake_timeout),
        echo: if args.local_echo { EchoPolicy::LocalEcho } else { EchoPolicy::ServerEcho },
    };

    tracing::info!(endpoint = %config.endpoint, "wirechat starting");

    let runtime = Runtime::new(TerminalDriver::new()?, SystemEnv::new(), config);
    runtime.run().await?;

    tracing::info!("wirechat exiting");
    Ok(())
}
