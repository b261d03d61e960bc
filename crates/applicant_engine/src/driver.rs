use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("browser protocol error: {0}")]
    Protocol(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("browser unavailable: {0}")]
    Unavailable(String),
}

/// Minimal control surface over one browser tab.
///
/// Everything the crawler reads goes through `content`; everything it does to
/// the page is a `click` or a `reload`.
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    async fn current_url(&self) -> Result<Option<String>, DriverError>;

    /// Serialized DOM of the tab as currently rendered.
    async fn content(&self) -> Result<String, DriverError>;

    /// Clicks the `index`-th match of `selector`. Returns `false` when there is no such element.
    async fn click(&self, selector: &str, index: usize) -> Result<bool, DriverError>;

    async fn reload(&self) -> Result<(), DriverError>;
}
