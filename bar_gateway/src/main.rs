use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use bar_gateway::{
    clock::SystemClock,
    config::GatewayConfig,
    gateway::BarQueryGateway,
    http,
    providers::alpaca_rest::AlpacaProvider,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Historical stock bar gateway")]
struct Cli {
    /// Path to a TOML config file (bar_gateway.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on; overrides config and BAR_GATEWAY_BIND
    #[arg(long)]
    bind: Option<std::net::IpAddr>,

    /// Port to listen on; overrides config and BAR_GATEWAY_PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = GatewayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let provider = AlpacaProvider::new(config.alpaca_settings())
        .context("initializing Alpaca provider")?;
    let gateway = Arc::new(BarQueryGateway::new(
        Arc::new(provider),
        Arc::new(SystemClock),
        config.gateway_settings(),
    ));

    let app = http::router(gateway, &config.allowed_origins);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, feed = ?config.feed, "bar gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("bar gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
