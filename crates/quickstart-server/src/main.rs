//! `quickstart-server`: runs the admin console from a YAML configuration file.

mod assets;
mod bootstrap;

use anyhow::Context;
use clap::Parser;
use quickstart_core::{LogFormat, ObservabilityConfig, QuickstartConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quickstart-server", version, about = "Admin console quickstart server")]
struct Cli {
    /// Configuration file (YAML). Defaults apply when omitted.
    #[arg(long, short = 'c', env = "QUICKSTART_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured listen port.
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match observability.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => QuickstartConfig::load_with_context(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => QuickstartConfig::default(),
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.observability);
    if let Some(path) = &cli.config {
        tracing::info!(config = %path.display(), "Configuration loaded");
    }

    let server = bootstrap::build_server(config)?;
    server.run().await?;
    Ok(())
}
