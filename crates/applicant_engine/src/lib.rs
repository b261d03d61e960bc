//! Applicant engine: browser driving, extraction, downloads and export.
mod chrome;
mod crawl;
mod driver;
mod export;
mod extract;
mod filename;
mod flag;
mod persist;
mod profile;
mod relay;
mod site;
mod text;
mod types;
mod wait;

pub use chrome::{BrowserSession, ChromeDriver, LaunchOptions, LocalStorageFlagStore};
pub use crawl::{CrawlError, CrawlEventSink, CrawlSettings, Crawler, DownloadSink};
pub use driver::{DriverError, PageDriver};
pub use export::{csv_data_url, to_csv, ExportError, CSV_FILENAME, CSV_HEADER};
pub use extract::{inner_text, DetailPanel, ListPage};
pub use filename::sanitize_filename;
pub use flag::{
    clear_crawl_request, crawl_requested, request_crawl, FileFlagStore, FlagError, FlagStore,
    MemoryFlagStore, CRAWL_FLAG_KEY, FLAG_ACTIVE,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, SavedFile};
pub use profile::{ProfileError, SiteProfile, SiteSelectors};
pub use relay::{decode_data_url, DownloadRelay, Downloader, HttpDownloader, RelaySettings};
pub use site::ApplicantSite;
pub use text::{
    clean_applicant_name, format_experiences, format_screening, parse_current_page,
    parse_total_pages, placeholder_name, resume_filename,
};
pub use types::{
    CandidateRecord, CrawlEvent, CycleOutcome, DownloadError, DownloadRequest, FailureKind,
    RelayEvent,
};
pub use wait::{wait_for_stable, wait_until, ReadinessPolicy, WaitError};
