//! Rover server binary.
//!
//! # Usage
//!
//! ```bash
//! # On the rover
//! rover-server --bind 0.0.0.0:8080 --static-dir ./client
//!
//! # Anywhere else, without touching GPIO
//! rover-server --static-dir ./client --dry-run
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use rover_server::{ActuationConfig, GpioBackend, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Rover control server
#[derive(Parser, Debug)]
#[command(name = "rover-server")]
#[command(about = "Single-driver remote control server for a GPIO rover")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Directory holding index.html, favicon.ico, rover-client.js and protocol.js
    #[arg(short, long)]
    static_dir: Option<PathBuf>,

    /// Sysfs GPIO root
    #[arg(long, default_value = "/sys/class/gpio")]
    gpio_root: PathBuf,

    /// Log pin changes instead of driving GPIO
    #[arg(long)]
    dry_run: bool,

    /// Duration of a left/right turn in milliseconds
    #[arg(long, default_value = "200")]
    turn_ms: u64,

    /// Duration of a forward/back move in milliseconds
    #[arg(long, default_value = "1000")]
    drive_ms: u64,

    /// Motions that may wait behind the one in progress
    #[arg(long, default_value = "1")]
    queue_depth: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Rover server starting");
    tracing::info!("Binding to {}", args.bind);

    if args.static_dir.is_none() {
        tracing::warn!("No static directory given - the client page will return 404");
    }
    let gpio = if args.dry_run {
        tracing::warn!("Dry run - motor pins will not be driven");
        GpioBackend::DryRun
    } else {
        GpioBackend::Sysfs(args.gpio_root)
    };

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        static_dir: args.static_dir,
        gpio,
        actuation: ActuationConfig {
            turn: Duration::from_millis(args.turn_ms),
            drive: Duration::from_millis(args.drive_ms),
            queue_depth: args.queue_depth,
        },
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
