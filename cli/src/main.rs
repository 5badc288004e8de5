//! Identity service CLI
//!
//! ```sh
//! # Run with default config (~/.config/identity-core/config.toml)
//! identity-service
//!
//! # Custom config path and port
//! identity-service --config /etc/identity-core/config.toml --port 8081
//!
//! # Validate config without starting
//! identity-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use identity_core::config::AppConfig;
use identity_core::server::{init_tracing, ServerHandle, ServerOptions};

/// Registration, login and password reset over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "identity-service",
    version,
    about = "Identity service: registration, JWT login and password reset",
    long_about = "REST API server for account registration, JWT access/refresh \
                  tokens and email-based password reset.\n\n\
                  Default config: ~/.config/identity-core/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "IDENTITY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(identity_core::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            std::process::exit(2);
        }
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());
    if let Ok(path) = dotenv {
        info!("Environment loaded from {}", path.display());
    }

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(2);
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.address());
        println!("   Email       : {:?}", config.email.provider);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    if cli.no_migrate {
        warn!("Database migrations disabled");
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;

    Ok(())
}
