//! Socksrelay - Minimal SOCKS5 Relay
//!
//! This is the main entry point for the Socksrelay application.

use anyhow::{anyhow, Result};
use clap::Parser;
use socksrelay::config::{load_config, ServerConfig};
use socksrelay::run_server;
use socksrelay::stun::spawn_public_addr_report;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Socksrelay - SOCKS5 relay with optional username/password authentication
#[derive(Parser, Debug)]
#[command(name = "socksrelay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listen address (all interfaces when empty)
    #[arg(short, long)]
    address: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// SOCKS5 username
    #[arg(short, long)]
    username: Option<String>,

    /// SOCKS5 password
    #[arg(short = 'P', long)]
    password: Option<String>,

    /// Log every client and destination at info level
    #[arg(long)]
    log: bool,

    /// Path to an optional configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,

    /// Skip the public address lookup at startup
    #[arg(long)]
    no_public_ip: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    let config = build_config(&args)?;

    info!("Socksrelay v{}", socksrelay::VERSION);
    if let Some(path) = &args.config {
        info!("Configuration loaded from: {:?}", path);
    }
    print_banner(&config);
    if config.stun.enabled {
        spawn_public_addr_report(config.stun.clone());
    }

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("Received Ctrl+C, shutting down...");
                        }
                        _ = sigterm.recv() => {
                            info!("Received SIGTERM, shutting down...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Received Ctrl+C, shutting down...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            // On Windows, only handle Ctrl+C
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
        }

        let _ = shutdown_tx_clone.send(true);
    });

    run_server(config, shutdown_rx).await
}

/// Merge the optional config file with command line overrides
fn build_config(args: &Args) -> Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    if let Some(address) = &args.address {
        config.address = address.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.username.is_some() {
        config.socks.username = args.username.clone();
    }
    if args.password.is_some() {
        config.socks.password = args.password.clone();
    }
    if args.log {
        config.socks.log_connections = true;
    }
    if args.no_public_ip {
        config.stun.enabled = false;
    }

    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Print listen address and credentials
fn print_banner(config: &ServerConfig) {
    let shown_addr = if config.address.is_empty() {
        format!("*:{}", config.port)
    } else {
        config.listen_addr()
    };
    info!("Listen address: {}", shown_addr);

    if let Some(credentials) = config.socks.credentials() {
        info!("Username: {}", credentials.username);
        info!("Password: {}", "*".repeat(credentials.password.chars().count()));
    } else {
        info!("Authentication: none");
    }
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
