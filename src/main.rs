use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use mjpeg_relay::{init_logging, LogFormat, LoggingConfig, RelayConfig, RelayServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "mjpeg-relay")]
#[command(about = "Encrypted WebSocket to MJPEG frame relay", long_about = None)]
struct Args {
    /// Listen address
    #[arg(long, env = "RELAY_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "RELAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (pretty, json)
    #[arg(long, env = "RELAY_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    /// Delay between frames sent to each viewer, in milliseconds
    #[arg(long, env = "RELAY_FRAME_INTERVAL_MS", default_value = "50")]
    frame_interval_ms: u64,

    /// Largest accepted WebSocket message, in bytes
    #[arg(long, env = "RELAY_MAX_MESSAGE_BYTES", default_value = "2097152")]
    max_message_bytes: usize,

    /// Allowed CORS origin; repeat or comma-separate for several, `*` for any
    #[arg(
        long,
        env = "RELAY_CORS_ORIGIN",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    cors_origin: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&LoggingConfig {
        level: args.log_level.clone(),
        format: args.log_format,
    })
    .context("failed to initialize logging")?;

    let config = ServerConfig::with_addr(args.addr)
        .max_message_size(args.max_message_bytes)
        .cors_origins(args.cors_origin)
        .relay(RelayConfig::default().frame_interval(Duration::from_millis(args.frame_interval_ms)));

    tracing::info!(
        addr = %config.bind_addr,
        frame_interval_ms = args.frame_interval_ms,
        max_message_bytes = config.max_message_size,
        "Starting mjpeg-relay"
    );

    let server = RelayServer::new(config);
    server
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            }
        })
        .await
        .context("relay server failed")?;

    Ok(())
}
