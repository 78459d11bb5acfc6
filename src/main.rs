//! HierMeasure command line interface

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use cli::context::CliContext;
use cli::dispatch::dispatch;
use cli::env::CliArgs;
use cli::runtime::{init_logging, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug)?;
    info!("Starting HierMeasure v{}", env!("CARGO_PKG_VERSION"));

    let loaded = load_config(cli.config.as_ref()).await?;
    let ctx = CliContext::new(loaded.config, loaded.path, cli.output);
    info!(config = %ctx.config_path().display(), "host configuration resolved");

    let result = dispatch(&cli, &ctx).await;
    ctx.shutdown().await;

    if let Err(err) = &result {
        error!("Command failed: {:#}", err);
    }
    result
}
