use anyhow::{bail, Context, Result};
use applicant_engine::{request_crawl, FileFlagStore, LocalStorageFlagStore};
use crawl_logging::{crawl_debug, crawl_info};

use crate::browser;
use crate::config::{CrawlerConfig, FlagBackend};

/// Sets the start flag where the watcher will see it, then returns.
pub async fn run(config: &CrawlerConfig) -> Result<()> {
    match &config.flag_store {
        FlagBackend::File(path) => {
            let store = FileFlagStore::new(path);
            request_crawl(&store)
                .await
                .with_context(|| format!("writing flag file {}", path.display()))?;
            crawl_info!("Crawl requested through {:?}", path);
        }
        FlagBackend::Page => {
            if config.browser.debug_url.is_none() {
                bail!("the page flag store needs browser.debug_url (or --debug-url) to reach the running browser");
            }
            let mut session = browser::open(config).await?;
            let Some(page) = session.active_page().await? else {
                crawl_debug!("No active tab; nothing to trigger");
                return Ok(());
            };
            request_crawl(&LocalStorageFlagStore::new(page))
                .await
                .context("setting the start flag in the active tab")?;
            crawl_info!("Crawl requested in the active tab");
        }
    }
    Ok(())
}
