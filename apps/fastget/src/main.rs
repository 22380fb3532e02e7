//! fastget entry point.
//!
//! Usage: `fastget [OPTIONS] <REMOTE> <LOCAL>`

mod app;
mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = args.load_config()?;
    tracing::info!(
        root = %config.root.display(),
        home = %config.home,
        "configuration loaded"
    );
    let options = args.transfer_options(&config);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(&config, options, &args.remote, &args.local))?;
    Ok(())
}
