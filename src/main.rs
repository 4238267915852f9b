//! Text-line Chat Relay - Entry Point
//!
//! Loads configuration, starts the TCP listener and registry actor, and
//! accepts connections.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::{handle_connection, Config, Registry};

/// Channel buffer size for registry commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[derive(Debug, Parser)]
#[command(name = "chat_relay", about = "Text-line TCP chat relay")]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Path to a JSON config file; built-in defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let args = Args::parse();

    // Load config (validated at load time), apply the CLI port override
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => {
            let config = Config::default();
            config.validate()?;
            config
        }
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    let welcome = config.load_banner()?;
    let config = Arc::new(config);

    // Start TCP listener; a bind failure is fatal
    let addr = format!("{}:{}", config.addr, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Chat relay listening on {}", addr);

    // Create registry actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let registry = Registry::new(config.clone(), welcome, cmd_rx);
    tokio::spawn(registry.run());

    info!("Registry actor started");

    // Connection accept loop; one bad accept must not kill the server
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let config = config.clone();

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, config).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
