//! Orderflow daemon.
//!
//! Custom order statuses, workflow rule automation, status history, and a
//! customer-facing tracking surface over a storefront platform's orders.

use clap::Parser;
use orderflow_service::{ServiceConfig, ServiceError, ServiceResult, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Orderflow daemon CLI.
#[derive(Parser)]
#[command(name = "orderflowd")]
#[command(about = "Orderflow daemon - order status workflow service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ORDERFLOW_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "ORDERFLOW_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "ORDERFLOW_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "ORDERFLOW_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> ServiceResult<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config = ServiceConfig::load(cli.config.as_deref())
        .map_err(|e| ServiceError::Config(e.to_string()))?;

    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| ServiceError::Config(format!("invalid listen address: {e}")))?;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        "starting orderflow daemon"
    );

    let server = Server::new(config).await?;
    server.run().await
}
