use std::fmt;
use std::path::PathBuf;

/// One scraped applicant; one CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateRecord {
    pub name: String,
    /// Empty when no resume link was found.
    pub resume_filename: String,
    /// One line per experience item, lines within an item joined by ` | `.
    pub experiences: String,
    /// One `Q: ... | A: ...` line per screening question.
    pub screening: String,
}

/// Fire-and-forget request to the download relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub download_url: String,
    pub filename: String,
}

impl DownloadRequest {
    pub fn new(download_url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            download_url: download_url.into(),
            filename: filename.into(),
        }
    }

    /// The relay only acts on requests where both fields are present.
    pub fn is_actionable(&self) -> bool {
        !self.download_url.is_empty() && !self.filename.is_empty()
    }
}

/// Progress reported by a running crawl cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    PageStarted { page: u32, total: u32 },
    CandidateScraped { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    Halted,
    Reloaded,
    Failed(String),
}

/// Diagnostics from the relay worker. Requesters never see these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Saved { filename: String, path: PathBuf, bytes: u64 },
    Ignored,
    Failed { filename: String, error: DownloadError },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DownloadError {
    pub kind: FailureKind,
    pub message: String,
}

impl DownloadError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    UnsupportedScheme(String),
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
    Write,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::UnsupportedScheme(scheme) => write!(f, "unsupported scheme {scheme}"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Write => write!(f, "write error"),
        }
    }
}
