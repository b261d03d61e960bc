use std::sync::Arc;
use std::time::Duration;

use crawl_logging::{crawl_debug, crawl_error, crawl_info, crawl_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::driver::DriverError;
use crate::export::{csv_data_url, to_csv, ExportError, CSV_FILENAME};
use crate::site::ApplicantSite;
use crate::text::{
    clean_applicant_name, format_experiences, format_screening, placeholder_name,
    resume_filename,
};
use crate::wait::{wait_for_stable, wait_until, ReadinessPolicy, WaitError};
use crate::{CandidateRecord, CrawlEvent, CycleOutcome, DownloadRequest};

/// Where the crawler sends resume and CSV downloads.
pub trait DownloadSink: Send + Sync {
    fn send(&self, request: DownloadRequest);
}

pub trait CrawlEventSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

#[derive(Clone)]
pub struct CrawlSettings {
    pub readiness: ReadinessPolicy,
    /// Pause between spotting the virus-scan notice and reloading the page.
    pub virus_scan_pause: Duration,
    /// Capture time in epoch milliseconds, stamped into generated names.
    pub captured_at: Arc<dyn Fn() -> i64 + Send + Sync>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            readiness: ReadinessPolicy::default(),
            virus_scan_pause: Duration::from_millis(5000),
            captured_at: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error("could not build csv: {0}")]
    Export(#[from] ExportError),
}

enum PageScrape {
    Done,
    Reloaded,
}

/// Crawl engine for one tab. Owns the scraped results, which accumulate across cycles.
pub struct Crawler {
    site: ApplicantSite,
    downloads: Arc<dyn DownloadSink>,
    settings: CrawlSettings,
    results: Vec<CandidateRecord>,
}

impl Crawler {
    pub fn new(
        site: ApplicantSite,
        downloads: Arc<dyn DownloadSink>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            site,
            downloads,
            settings,
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[CandidateRecord] {
        &self.results
    }

    /// Runs one crawl cycle. Errors end the cycle without exporting.
    ///
    /// `cancel` is only consulted between pages and between candidates; an
    /// in-flight wait always runs to completion.
    pub async fn run_cycle(
        &mut self,
        cancel: &CancellationToken,
        events: &dyn CrawlEventSink,
    ) -> CycleOutcome {
        match self.crawl_all_pages(cancel, events).await {
            Ok(outcome) => outcome,
            Err(err) => {
                crawl_error!("Error in crawl cycle: {}", err);
                CycleOutcome::Failed(err.to_string())
            }
        }
    }

    async fn crawl_all_pages(
        &mut self,
        cancel: &CancellationToken,
        events: &dyn CrawlEventSink,
    ) -> Result<CycleOutcome, CrawlError> {
        let total = self.site.total_pages().await?;
        crawl_info!("Starting crawl over {} page(s)", total);

        for page in 1..=total {
            if cancel.is_cancelled() {
                break;
            }

            if page > 1 {
                if self.site.open_page(page).await? {
                    crawl_info!("Clicked on page {}... waiting to load", page);
                    let site = &self.site;
                    wait_until(&self.settings.readiness, "page navigation", || async move {
                        Ok::<_, DriverError>(site.current_page().await? == Some(page))
                    })
                    .await?;
                } else {
                    crawl_debug!("No pagination control for page {}; staying put", page);
                }
            }

            events.emit(CrawlEvent::PageStarted { page, total });
            if let PageScrape::Reloaded = self.scrape_candidates_on_page(cancel, events).await? {
                // The reload restarts the page context, so this run's rows are discarded.
                self.results.clear();
                return Ok(CycleOutcome::Reloaded);
            }
        }

        let halted = cancel.is_cancelled();
        if !self.results.is_empty() {
            let csv = to_csv(&self.results)?;
            self.downloads
                .send(DownloadRequest::new(csv_data_url(&csv), CSV_FILENAME));
            crawl_info!("Requested {} with {} candidate(s)", CSV_FILENAME, self.results.len());
        }

        Ok(if halted {
            crawl_info!("Crawl halted");
            CycleOutcome::Halted
        } else {
            crawl_info!("Crawl completed");
            CycleOutcome::Completed
        })
    }

    async fn scrape_candidates_on_page(
        &mut self,
        cancel: &CancellationToken,
        events: &dyn CrawlEventSink,
    ) -> Result<PageScrape, CrawlError> {
        let count = self.site.candidate_count().await?;
        crawl_debug!("{} candidate(s) listed on this page", count);

        for index in 0..count {
            if cancel.is_cancelled() {
                break;
            }
            let site = &self.site;
            let readiness = &self.settings.readiness;

            let shown_before = &site.detail().await?;
            if !site.open_candidate(index).await? {
                crawl_debug!("Candidate {} disappeared from the list", index);
                continue;
            }

            let switched = wait_for_stable(readiness, "candidate detail", || async move {
                let detail = site.detail().await?;
                Ok::<_, DriverError>((detail != *shown_before).then_some(detail))
            })
            .await;
            let mut detail = match switched {
                Ok(detail) => detail,
                // Neighbouring candidates may render identical panels.
                Err(WaitError::Timeout { waited, .. }) => {
                    crawl_warn!(
                        "Panel unchanged {:?} after opening candidate {}; scraping it as shown",
                        waited,
                        index
                    );
                    site.detail().await?
                }
                Err(err) => return Err(err.into()),
            };

            if detail.virus_scan {
                crawl_info!(
                    "Virus scan in progress; waiting {:?}, then reloading...",
                    self.settings.virus_scan_pause
                );
                tokio::time::sleep(self.settings.virus_scan_pause).await;
                site.reload().await?;
                return Ok(PageScrape::Reloaded);
            }

            let captured_at = (self.settings.captured_at)();

            let mut resume_file = String::new();
            if let Some(href) = detail.resume_href.as_deref() {
                match site.resolve_link(href).await? {
                    Some(url) => {
                        resume_file = resume_filename(captured_at);
                        self.downloads
                            .send(DownloadRequest::new(url, resume_file.clone()));
                    }
                    None => crawl_debug!("Resume link {:?} could not be resolved", href),
                }
            }

            if detail.should_expand(&site.profile().show_more_marker)
                && site.expand_experience().await?
            {
                let expanded = wait_until(readiness, "experience expansion", || async move {
                    Ok::<_, DriverError>(site.detail().await?.show_more_label.is_none())
                })
                .await;
                match expanded {
                    Ok(()) => {}
                    Err(WaitError::Timeout { waited, .. }) => {
                        crawl_warn!("Experience list still collapsed after {:?}", waited);
                    }
                    Err(err) => return Err(err.into()),
                }
                detail = site.detail().await?;
            }

            let name = match detail.heading.as_deref() {
                Some(heading) => clean_applicant_name(heading),
                None => placeholder_name(captured_at),
            };
            let record = CandidateRecord {
                name: name.clone(),
                resume_filename: resume_file,
                experiences: format_experiences(&detail.experiences),
                screening: format_screening(&detail.screening),
            };
            crawl_debug!("Scraped {}", name);
            events.emit(CrawlEvent::CandidateScraped { name });
            self.results.push(record);
        }

        Ok(PageScrape::Done)
    }
}
