//! Headless VNC client example - connect, click once, and disconnect.
//!
//! Usage:
//!   cargo run --example headless_connect --features cli -- 192.168.1.100 --port 5900
//!
//! This example demonstrates:
//! - Building a configuration from the command line and an optional TOML file
//! - Opening a connection without blocking
//! - Rendering status events as a single status line
//! - Sending a left click once the handshake is Ready
//! - Graceful shutdown

use rfb_remote::args::Args;
use rfb_remote::{Config, PointerButton, RfbClient, ServerEvent};
use tokio::time::timeout;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_filter())),
        )
        .init();

    let config = Config::from_args(&args)?;
    let (address, port) = config.target_text()?;
    let wait = config.timeout() * 2;

    let client = RfbClient::new(config)?;
    let events = client.events();
    client.open(&address, &port)?;

    let mut ready = false;
    loop {
        let event = match timeout(wait, events.recv_async()).await {
            Ok(Ok(event)) => event,
            Ok(Err(_)) => break,
            Err(_) => {
                error!("No status from the connection for {:?}", wait);
                break;
            }
        };

        info!("status: {}", event);
        match event {
            ServerEvent::Connected { width, height, .. } => {
                let (x, y) = (width / 2, height / 2);
                client.mouse_event(PointerButton::Left, true, x, y).await?;
                client.mouse_event(PointerButton::Left, false, x, y).await?;
                info!("Clicked at ({}, {})", x, y);
                ready = true;
                break;
            }
            ServerEvent::Error { message } => {
                error!("{}", message);
                break;
            }
            ServerEvent::Status { .. } | ServerEvent::Disconnected => {}
        }
    }

    info!("Shutting down...");
    client.close().await?;
    while let Ok(event) = events.try_recv() {
        info!("status: {}", event);
    }

    if !ready {
        anyhow::bail!("connection did not become ready");
    }
    Ok(())
}
