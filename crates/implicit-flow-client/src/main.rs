//! Implicit-Flow Client - Entry Point

use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use implicit_flow_client::{config::ClientConfig, server::ClientServer};

#[derive(Parser, Debug)]
#[command(name = "implicit-flow-client")]
#[command(about = "OAuth2 implicit-flow demo client")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    host: IpAddr,

    /// HTTP server port
    #[arg(long, default_value = "8082", env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting implicit-flow client");

    let config = ClientConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    ClientServer::new(config).run_http(SocketAddr::new(cli.host, cli.port)).await
}
