//! nem-bridge
//!
//! Serves NEM node operations as line-delimited JSON-RPC on stdin/stdout.
//!
//! # Architecture Overview
//!
//! ```text
//!   stdin ──▶ rpc::FrameReader ──▶ rpc::Dispatcher ──▶ HandlerRegistry
//!                                        │                   │
//!                                        │                   ▼
//!   stdout ◀── response frames ◀─────────┘            NodeFacade (NisClient)
//!                                                            │
//!                                                            ▼
//!                                                      NIS REST node
//!
//!   stderr ◀── tracing logs        config / lifecycle / observability
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;

use nem_bridge::config::{self, BridgeConfig, ConfigError};
use nem_bridge::lifecycle::{spawn_signal_handler, Shutdown};
use nem_bridge::nem::{Network, NisClient, NodeFacade};
use nem_bridge::observability::{logging, metrics};
use nem_bridge::rpc::{nem_registry, Dispatcher};

#[derive(Parser)]
#[command(name = "nem-bridge")]
#[command(version, about = "Line-delimited JSON-RPC bridge to a NEM node", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node host, overrides endpoint.host
    #[arg(long)]
    host: Option<String>,

    /// Node port, overrides endpoint.port
    #[arg(long)]
    port: Option<u16>,

    /// mainnet, testnet or mijin
    #[arg(long)]
    network: Option<Network>,

    /// Log level, overrides observability.log_level
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load_config(&self) -> Result<BridgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => BridgeConfig::default(),
        };

        if let Some(host) = &self.host {
            config.endpoint.host = host.clone();
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }

        config::validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config));

    // A blocked stdin read must not hold the process open.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run(config: BridgeConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "nem-bridge starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let facade: Arc<dyn NodeFacade> = Arc::new(NisClient::new(&config.endpoint, config.network)?);
    let dispatcher = Dispatcher::new(nem_registry()?, facade, &config.dispatcher);
    tracing::info!(methods = ?dispatcher.registry().method_names(), "Handlers registered");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    let _signals = spawn_signal_handler(shutdown.clone());

    let summary = dispatcher
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown_rx)
        .await?;

    tracing::info!(
        frames = summary.frames,
        responses = summary.responses,
        "Shutdown complete"
    );
    Ok(())
}
