//! oledcast daemon: entry point.
//!
//! ```text
//! oledcast                   Run in the foreground
//! oledcast --config <path>   Load a custom config TOML
//! oledcast --gen-config      Write default config to stdout
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use oledcast_daemon::config::DaemonConfig;
use oledcast_daemon::service::OledcastService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "oledcast", about = "Clock, media and hardware panels for GameSense OLEDs")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "oledcast.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = DaemonConfig::default().to_toml()?;
        println!("{text}");
        return Ok(());
    }

    let config = DaemonConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.file.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    info!("oledcast v{}", env!("CARGO_PKG_VERSION"));
    info!("target FPS: {}", config.display.fps.clamp(1, 60));
    info!(
        "panels: hardware={} media={} clock={}",
        config.display.hardware, config.display.media, config.display.clock
    );
    if config.extension.enabled {
        info!("extension port: {}", config.extension.port);
    }

    let service = OledcastService::new(config);
    let stop = service.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.notify_one();
    });

    service.run().await?;

    Ok(())
}
