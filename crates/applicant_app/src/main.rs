mod browser;
mod cli;
mod config;
mod logging;
mod runner;
mod trigger;

use anyhow::Result;
use clap::Parser;
use crawl_logging::crawl_info;

use crate::cli::{Cli, Command};
use crate::config::CrawlerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CrawlerConfig::load(&cli.global.config)?;
    config.apply_overrides(&cli.global);
    logging::initialize(&config.log, cli.global.log_level.map(Into::into));

    crawl_info!("applicant-crawler {} starting", env!("CARGO_PKG_VERSION"));
    match cli.command {
        Command::Trigger => trigger::run(&config).await,
        Command::Watch => {
            config.log_summary();
            runner::run(&config).await
        }
    }
}
