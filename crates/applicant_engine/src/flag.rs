use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crawl_logging::crawl_debug;
use thiserror::Error;

use crate::driver::DriverError;
use crate::persist::{AtomicFileWriter, PersistError};

/// Storage key of the cross-context start signal.
pub const CRAWL_FLAG_KEY: &str = "linkedinCrawlerActive";
pub const FLAG_ACTIVE: &str = "true";

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("flag store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("flag store {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("flag store could not be serialized: {0}")]
    Serialize(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Durable string key-value store shared by the trigger and the poller.
#[async_trait::async_trait]
pub trait FlagStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, FlagError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), FlagError>;
    async fn remove_item(&self, key: &str) -> Result<(), FlagError>;
}

pub async fn crawl_requested(store: &dyn FlagStore) -> Result<bool, FlagError> {
    Ok(store.get_item(CRAWL_FLAG_KEY).await?.as_deref() == Some(FLAG_ACTIVE))
}

pub async fn request_crawl(store: &dyn FlagStore) -> Result<(), FlagError> {
    store.set_item(CRAWL_FLAG_KEY, FLAG_ACTIVE).await
}

pub async fn clear_crawl_request(store: &dyn FlagStore) -> Result<(), FlagError> {
    store.remove_item(CRAWL_FLAG_KEY).await
}

#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_items<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> T {
        let mut guard = self
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

#[async_trait::async_trait]
impl FlagStore for MemoryFlagStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, FlagError> {
        Ok(self.with_items(|items| items.get(key).cloned()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), FlagError> {
        self.with_items(|items| items.insert(key.to_string(), value.to_string()));
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), FlagError> {
        self.with_items(|items| items.remove(key));
        Ok(())
    }
}

/// RON file holding a string map; lets the trigger and a headless watcher
/// share the flag without a browser tab.
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, FlagError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        ron::from_str(&content).map_err(|err| FlagError::Malformed {
            path: self.path.clone(),
            reason: err.to_string(),
        })
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<(), FlagError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(items, pretty)
            .map_err(|err| FlagError::Serialize(err.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| FlagError::Malformed {
                path: self.path.clone(),
                reason: "path has no file name".to_string(),
            })?;
        AtomicFileWriter::new(dir).write(&filename, content)?;
        crawl_debug!("Saved flag store {:?}", self.path);
        Ok(())
    }
}

#[async_trait::async_trait]
impl FlagStore for FileFlagStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, FlagError> {
        Ok(self.load()?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), FlagError> {
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }

    async fn remove_item(&self, key: &str) -> Result<(), FlagError> {
        let mut items = self.load()?;
        if items.remove(key).is_some() {
            self.save(&items)?;
        }
        Ok(())
    }
}
