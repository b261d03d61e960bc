//! Process-wide logger setup for the binary.

use log::LevelFilter;

use crate::config::LogConfig;

/// Installs the logger described by `config`; `level` comes from `--log-level`.
pub fn initialize(config: &LogConfig, level: Option<LevelFilter>) {
    crawl_logging::initialize(
        config.destination.into(),
        level.unwrap_or(LevelFilter::Info),
        &config.file,
    );
}
