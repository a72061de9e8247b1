//! seisplot command line entry point.

use anyhow::Result;
use clap::Parser;
use seisplot::{Args, Runner, SeisplotConfig};
use seisplot_common::{ConfigFile, LoggingConfig, init_tracing};
use seisplot_fdsn::FdsnClient;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = SeisplotConfig::load(&args.config)?;

    // Logging with optional CLI override
    let logging = match &args.log_level {
        Some(level) => LoggingConfig {
            level: level.clone(),
            ..config.logging().clone()
        },
        None => config.logging().clone(),
    };
    init_tracing(&logging)?;

    let command = args.command_or_default();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        event = %config.event.name,
        stations = config.stations.len(),
        command = ?command,
        "Starting seisplot"
    );

    let client = FdsnClient::new(&config.fdsn)?;
    tracing::debug!(url = client.query_url(), "FDSN client ready");

    let runner = Runner::new(config, client);
    runner.run(command).await?;

    tracing::info!(command = ?command, "Finished");
    Ok(())
}
