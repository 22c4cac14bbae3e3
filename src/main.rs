#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use anyhow::Result;
use clap::Parser;
use gamekeeper::Config;
use gamekeeper::app::dispatch::dispatch;
use gamekeeper::cli::Cli;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_init()?,
    };
    config.apply_env_overrides();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.observability.level()
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    dispatch(cli, config).await
}
