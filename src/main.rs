//! # RC Link
//!
//! Streams gamepad input to a flight controller as CRSF or MSP RC frames.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration, set up logging
//!    - Open the gamepad (fatal if missing) and start the input thread
//!
//! 2. **Main Loop**
//!    - Send one frame per tick at `[link] rate_hz`
//!    - Reopen the serial port whenever it drops
//!
//! 3. **Shutdown** (SIGINT/SIGTERM, kill button, or controller lost)
//!    - Disarm, send one final safe frame, close the port
//!    - Exit non-zero if the final frame could not be delivered

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use rc_link::config::{Config, LoggingConfig};
use rc_link::control::ControlHandle;
use rc_link::controller::{Gamepad, InputBridge};
use rc_link::frame::{FrameEncoder, Protocol};
use rc_link::serial::SerialTransport;
use rc_link::shutdown::{Shutdown, TerminationSignals};
use rc_link::transmitter::Transmitter;

#[derive(Parser)]
#[command(name = "rc-link", version)]
#[command(about = "Gamepad to flight controller over a CRSF or MSP serial link")]
struct Cli {
    /// Config file path (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override [link] protocol (crsf or msp)
    #[arg(short, long)]
    protocol: Option<Protocol>,
}

/// Installs the subscriber. `RUST_LOG` wins over the configured level.
///
/// The returned guard flushes the file writer and must outlive the program.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "rc-link.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(protocol) = cli.protocol {
        config.link.protocol = protocol;
        config.validate().context("Invalid configuration")?;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _log_guard = init_logging(&config.logging);

    info!("RC Link v{} starting...", env!("CARGO_PKG_VERSION"));

    let encoder = FrameEncoder::from_config(&config.link).context("Invalid link settings")?;
    let shutdown = Shutdown::new();
    let control = ControlHandle::new(config.control_settings(), shutdown.clone());

    // No transmitter without an input source
    let gamepad = Gamepad::open(&config.controller).context("No usable controller")?;
    InputBridge::new(gamepad, &config.controller, control.clone())
        .spawn()
        .context("Failed to start input thread")?;

    {
        let mut signals =
            TerminationSignals::install().context("Failed to install signal handlers")?;
        let control = control.clone();
        tokio::spawn(async move {
            let name = signals.recv().await;
            info!("Received {}, shutting down...", name);
            control.disarm();
            control.shutdown().trigger();
        });
    }

    let transport = SerialTransport::from_config(&config);
    info!("Serial candidates: {}", transport.candidates().join(", "));

    let transmitter = Transmitter::new(
        control,
        encoder,
        transport,
        config.link.rate_hz,
        Duration::from_secs(config.link.heartbeat_interval_s),
    );
    let report = transmitter.run().await;

    if report.left_link_unsafe() {
        error!("Link was live but the final disarm frame was not delivered");
        bail!(
            "shutdown did not reach a safe link state ({} frames sent)",
            report.stats.frames_sent
        );
    }

    info!("Total frames sent: {}", report.stats.frames_sent);
    Ok(())
}
