//! aliveimd - The aliveim keepalive service
//!
//! This is the main entry point for the aliveimd service.
//! It wires together all the components:
//! - Configuration loading (file, then CLI overrides)
//! - HTTP notifier for expiry notices
//! - Timer registry
//! - HTTP server for alive reports

use aliveim_config::{ServiceConfig, load_config_or_default, validate_api_url};
use aliveim_core::TimerRegistry;
use aliveim_http::{AppState, create_router};
use aliveim_notify::HttpNotifier;
use aliveim_util::{ALIVEIM_CONFIG_ENV, default_config_path};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// aliveimd - Device keepalive tracking service
#[derive(Parser, Debug)]
#[command(name = "aliveimd")]
#[command(about = "Tracks device keepalives and reports expired devices upstream", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path (default: ~/.config/aliveim/config.toml)
    #[arg(short, long, env = ALIVEIM_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Set the service host
    #[arg(long, env = "ALIVEIM_SERVICE_HOST")]
    service_host: Option<String>,

    /// Set the service port
    #[arg(long, env = "ALIVEIM_SERVICE_PORT")]
    service_port: Option<u16>,

    /// Set the API url that expiry notices are posted to
    #[arg(long, env = "ALIVEIM_API_URL")]
    api_url: Option<String>,

    /// Set the API token
    #[arg(long, env = "ALIVEIM_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration
    fn apply(&self, mut config: ServiceConfig) -> Result<ServiceConfig> {
        if let Some(host) = &self.service_host {
            config.listen.host = host.clone();
        }
        if let Some(port) = self.service_port {
            if port == 0 {
                bail!("--service-port must be non-zero");
            }
            config.listen.port = port;
        }
        if let Some(url) = &self.api_url {
            if let Some(err) = validate_api_url(url) {
                bail!("Invalid --api-url: {}", err);
            }
            config.notify.api_url = url.clone();
        }
        if let Some(token) = &self.api_token {
            config.notify.api_token = token.clone();
        }
        Ok(config)
    }
}

/// Main service state
struct Service {
    config: ServiceConfig,
    registry: TimerRegistry,
    listener: TcpListener,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let config = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;
        let config = args.apply(config)?;

        info!(
            config_path = %args.config.display(),
            listen = %config.listen.bind_addr(),
            api_url = %config.notify.api_url,
            "Configuration loaded"
        );

        let notifier = HttpNotifier::from_config(&config.notify)
            .context("Failed to create notification client")?;

        let registry = TimerRegistry::new(Arc::new(notifier));

        let addr = config.listen.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        Ok(Self {
            config,
            registry,
            listener,
        })
    }

    async fn run(self) -> Result<()> {
        let app = create_router(AppState::new(self.registry.clone()));

        info!(
            address = %self.config.listen.bind_addr(),
            "Starting aliveim service"
        );

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        // Graceful shutdown
        info!("Shutting down aliveimd");

        let dropped = self.registry.clear().await;
        info!(dropped, "Shutdown complete");
        Ok(())
    }
}

/// Wait for SIGTERM, SIGINT or SIGHUP
async fn shutdown_signal() {
    let (mut sigterm, mut sigint, mut sighup) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
        signal(SignalKind::hangup()),
    ) {
        (Ok(term), Ok(int), Ok(hup)) => (term, int, hup),
        _ => {
            error!("Failed to install signal handlers");
            // Sleep forever since we can't listen for signals
            std::future::pending::<()>().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
        _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "aliveimd starting"
    );

    let service = Service::new(&args).await?;
    service.run().await
}
