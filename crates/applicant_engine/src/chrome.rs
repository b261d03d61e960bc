//! Chrome DevTools implementation of the page driver and the page-local flag store.

use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Handler, Page};
use crawl_logging::{crawl_debug, crawl_info, crawl_warn};
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::driver::{DriverError, PageDriver};
use crate::flag::{FlagError, FlagStore};

impl From<CdpError> for DriverError {
    fn from(err: CdpError) -> Self {
        DriverError::Protocol(err.to_string())
    }
}

/// Drives one browser tab over CDP.
#[derive(Clone)]
pub struct ChromeDriver {
    page: Page,
}

impl ChromeDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Cookies of the tab in `Cookie:` header form, so resumes download as the signed-in user.
    pub async fn cookie_header(&self) -> Result<Option<String>, DriverError> {
        let cookies = self.page.get_cookies().await?;
        if cookies.is_empty() {
            return Ok(None);
        }
        let header = cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        Ok(Some(header))
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn current_url(&self) -> Result<Option<String>, DriverError> {
        Ok(self.page.url().await?)
    }

    async fn content(&self) -> Result<String, DriverError> {
        Ok(self.page.content().await?)
    }

    async fn click(&self, selector: &str, index: usize) -> Result<bool, DriverError> {
        let elements = self.page.find_elements(selector).await?;
        let Some(element) = elements.get(index) else {
            return Ok(false);
        };
        element.click().await?;
        Ok(true)
    }

    async fn reload(&self) -> Result<(), DriverError> {
        self.page.reload().await?;
        Ok(())
    }
}

/// `window.localStorage` of a tab, so the flag is shared with anything else on that origin.
#[derive(Clone)]
pub struct LocalStorageFlagStore {
    page: Page,
}

impl LocalStorageFlagStore {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Evaluates `script` in the tab; `null` and `undefined` both come back as `None`.
    async fn eval(&self, script: String) -> Result<Option<serde_json::Value>, FlagError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(DriverError::from)?;
        Ok(result.value().filter(|value| !value.is_null()).cloned())
    }
}

fn js_string(value: &str) -> Result<String, FlagError> {
    serde_json::to_string(value).map_err(|err| FlagError::Serialize(err.to_string()))
}

#[async_trait]
impl FlagStore for LocalStorageFlagStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, FlagError> {
        let value = self
            .eval(format!("window.localStorage.getItem({})", js_string(key)?))
            .await?;
        match value {
            None => Ok(None),
            Some(serde_json::Value::String(item)) => Ok(Some(item)),
            Some(other) => Err(FlagError::Driver(DriverError::Script(format!(
                "localStorage returned a non-string value: {other}"
            )))),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), FlagError> {
        self.eval(format!(
            "window.localStorage.setItem({}, {})",
            js_string(key)?,
            js_string(value)?
        ))
        .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), FlagError> {
        self.eval(format!(
            "window.localStorage.removeItem({})",
            js_string(key)?
        ))
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Profile directory; reuse one that is already signed in.
    pub user_data_dir: Option<PathBuf>,
}

/// A connected browser plus the task pumping its CDP handler.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Attaches to a running browser, e.g. `http://127.0.0.1:9222` or its websocket URL.
    pub async fn connect(debug_url: &str) -> Result<Self, DriverError> {
        let (browser, handler) = Browser::connect(debug_url).await?;
        crawl_info!("Connected to browser at {}", debug_url);
        Ok(Self::with_handler(browser, handler))
    }

    pub async fn launch(options: &LaunchOptions) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder();
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &options.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        let config = builder.build().map_err(DriverError::Unavailable)?;
        let (browser, handler) = Browser::launch(config).await?;
        crawl_info!("Launched browser (headless: {})", options.headless);
        Ok(Self::with_handler(browser, handler))
    }

    fn with_handler(browser: Browser, mut handler: Handler) -> Self {
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    crawl_warn!("Browser handler event error: {}", err);
                }
            }
            crawl_debug!("Browser handler finished");
        });
        Self {
            browser,
            handler_task,
        }
    }

    /// The tab the user is looking at: visible and focused, else the first visible one.
    pub async fn active_page(&mut self) -> Result<Option<Page>, DriverError> {
        self.browser.fetch_targets().await?;
        let pages = self.browser.pages().await?;

        let mut first_visible = None;
        for page in pages {
            let state = page
                .evaluate("[document.visibilityState === 'visible', document.hasFocus()]")
                .await
                .ok()
                .and_then(|value| value.into_value::<(bool, bool)>().ok());
            match state {
                Some((true, true)) => return Ok(Some(page)),
                Some((true, false)) if first_visible.is_none() => first_visible = Some(page),
                _ => {}
            }
        }
        Ok(first_visible)
    }

    pub async fn open_page(&self, url: &str) -> Result<Page, DriverError> {
        Ok(self.browser.new_page(url).await?)
    }

    /// The active tab, or a new one at `start_url` when no tab is visible.
    pub async fn working_page(
        &mut self,
        start_url: Option<&str>,
    ) -> Result<Option<Page>, DriverError> {
        if let Some(page) = self.active_page().await? {
            return Ok(Some(page));
        }
        match start_url {
            Some(url) => {
                crawl_info!("No visible tab; opening {}", url);
                Ok(Some(self.open_page(url).await?))
            }
            None => Ok(None),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
