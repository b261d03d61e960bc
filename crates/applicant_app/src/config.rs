//! `applicant-crawler.ron`: every knob of the binary, all optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use applicant_engine::{CrawlSettings, LaunchOptions, ReadinessPolicy, RelaySettings, SiteProfile};
use crawl_logging::{crawl_info, LogDestination};
use serde::{Deserialize, Serialize};

use crate::cli::GlobalArgs;

pub const DEFAULT_CONFIG_FILE: &str = "applicant-crawler.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub browser: BrowserSettings,
    pub flag_store: FlagBackend,
    pub output_dir: PathBuf,
    pub poll_interval_ms: u64,
    pub virus_scan_pause_ms: u64,
    pub readiness: ReadinessConfig,
    pub relay: RelayConfig,
    pub site: SiteProfile,
    pub log: LogConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            browser: BrowserSettings::default(),
            flag_store: FlagBackend::Page,
            output_dir: PathBuf::from("candidates"),
            poll_interval_ms: 2000,
            virus_scan_pause_ms: 5000,
            readiness: ReadinessConfig::default(),
            relay: RelayConfig::default(),
            site: SiteProfile::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Attach to this browser instead of launching one.
    pub debug_url: Option<String>,
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    /// Opened when the browser has no visible tab.
    pub start_url: Option<String>,
}

/// Where the start flag lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagBackend {
    /// `localStorage` of the crawled tab.
    #[default]
    Page,
    /// A RON key-value file.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub timeout_ms: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            initial_backoff_ms: 100,
            max_backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Send the crawled tab's cookies with resume downloads.
    pub forward_cookies: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 60_000,
            redirect_limit: 10,
            max_bytes: 50 * 1024 * 1024,
            forward_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub destination: LogTarget,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            destination: LogTarget::Terminal,
            file: PathBuf::from("applicant-crawler.log"),
        }
    }
}

impl CrawlerConfig {
    /// Reads the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn apply_overrides(&mut self, args: &GlobalArgs) {
        if let Some(dir) = &args.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(url) = &args.debug_url {
            self.browser.debug_url = Some(url.clone());
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            headless: self.browser.headless,
            user_data_dir: self.browser.user_data_dir.clone(),
        }
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            output_dir: self.output_dir.clone(),
            connect_timeout: Duration::from_millis(self.relay.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.relay.request_timeout_ms),
            redirect_limit: self.relay.redirect_limit,
            max_bytes: self.relay.max_bytes,
        }
    }

    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            readiness: ReadinessPolicy {
                timeout: Duration::from_millis(self.readiness.timeout_ms),
                initial_backoff: Duration::from_millis(self.readiness.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.readiness.max_backoff_ms),
            },
            virus_scan_pause: Duration::from_millis(self.virus_scan_pause_ms),
            ..CrawlSettings::default()
        }
    }

    pub fn log_summary(&self) {
        crawl_info!(
            "Output dir {:?}, flag store {:?}, polling every {} ms",
            self.output_dir,
            self.flag_store,
            self.poll_interval_ms
        );
    }
}
