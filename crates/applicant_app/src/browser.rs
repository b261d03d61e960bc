use anyhow::{Context, Result};
use applicant_engine::BrowserSession;

use crate::config::CrawlerConfig;

/// Attaches to `browser.debug_url` when set, otherwise launches a browser.
pub async fn open(config: &CrawlerConfig) -> Result<BrowserSession> {
    match &config.browser.debug_url {
        Some(url) => BrowserSession::connect(url)
            .await
            .with_context(|| format!("connecting to browser at {url}")),
        None => BrowserSession::launch(&config.launch_options())
            .await
            .context("launching browser"),
    }
}
