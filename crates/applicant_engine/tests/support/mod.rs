#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard, Once};
use std::time::Duration;

use applicant_engine::{
    CrawlEvent, CrawlEventSink, CrawlSettings, DownloadRequest, DownloadSink, DriverError,
    PageDriver, ReadinessPolicy, SiteProfile,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(crawl_logging::initialize_for_tests);
}

pub const CAPTURED_AT: i64 = 1_700_000_000_000;

/// Fast readiness and a fixed clock, so names derived from capture time are predictable.
pub fn test_settings() -> CrawlSettings {
    CrawlSettings {
        readiness: ReadinessPolicy {
            timeout: Duration::from_millis(300),
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
        },
        virus_scan_pause: Duration::from_millis(1),
        captured_at: Arc::new(|| CAPTURED_AT),
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeCandidate {
    pub heading: Option<String>,
    pub resume_href: Option<String>,
    pub experiences: Vec<Vec<String>>,
    /// Only rendered after the "show more" control is clicked.
    pub collapsed_experiences: Vec<Vec<String>>,
    pub screening: Vec<(String, String)>,
    /// Shows the virus-scan card instead of the panel until the next reload.
    pub scanning: bool,
}

impl FakeCandidate {
    pub fn named(name: &str) -> Self {
        Self {
            heading: Some(format!("{name}\u{2019}s application for Staff Engineer")),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn resume(mut self, href: &str) -> Self {
        self.resume_href = Some(href.to_string());
        self
    }

    pub fn experience(mut self, lines: &[&str]) -> Self {
        self.experiences
            .push(lines.iter().map(|line| line.to_string()).collect());
        self
    }

    pub fn collapsed_experience(mut self, lines: &[&str]) -> Self {
        self.collapsed_experiences
            .push(lines.iter().map(|line| line.to_string()).collect());
        self
    }

    pub fn screening(mut self, question: &str, answer: &str) -> Self {
        self.screening
            .push((question.to_string(), answer.to_string()));
        self
    }

    pub fn scanning(mut self) -> Self {
        self.scanning = true;
        self
    }
}

#[derive(Debug)]
pub struct FakeState {
    pub pages: Vec<Vec<FakeCandidate>>,
    pub page: usize,
    pub selected: Option<usize>,
    pub expanded: bool,
    pub show_page_state: bool,
    pub page_buttons: bool,
    /// Page buttons accept clicks but never navigate.
    pub stuck_pagination: bool,
    /// Fail every `content` call after this many have succeeded.
    pub fail_content_after: Option<usize>,
    pub content_calls: usize,
    /// After a candidate click, this many `content` reads still return the previous page.
    pub click_lag: usize,
    pub stale: Option<(String, usize)>,
    pub cancel_after_candidates: Option<(usize, CancellationToken)>,
    pub candidate_clicks: usize,
    pub clicks: Vec<String>,
    pub reloads: usize,
    pub url: Option<String>,
}

/// In-memory applicant-review site that renders the markup the default profile expects.
pub struct FakeSite {
    profile: SiteProfile,
    state: Mutex<FakeState>,
}

impl FakeSite {
    pub fn new(pages: Vec<Vec<FakeCandidate>>) -> Arc<Self> {
        Arc::new(Self {
            profile: SiteProfile::default(),
            state: Mutex::new(FakeState {
                pages,
                page: 1,
                selected: None,
                expanded: false,
                show_page_state: true,
                page_buttons: true,
                stuck_pagination: false,
                fail_content_after: None,
                content_calls: 0,
                click_lag: 0,
                stale: None,
                cancel_after_candidates: None,
                candidate_clicks: 0,
                clicks: Vec::new(),
                reloads: 0,
                url: Some("https://www.linkedin.com/hiring/jobs/42/applicants/".to_string()),
            }),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state().clicks.clone()
    }

    fn render(state: &FakeState) -> String {
        let total = state.pages.len().max(1);
        let mut html = String::from("<html><body><main>");

        if state.show_page_state {
            html.push_str(&format!(
                r#"<div class="artdeco-pagination__page-state">
                    Page {} of {}
                </div>"#,
                state.page, total
            ));
        }
        if state.page_buttons {
            html.push_str("<ul class=\"artdeco-pagination__pages\">");
            for k in 1..=total {
                html.push_str(&format!(
                    r#"<li data-test-pagination-page-btn="{k}"><button>{k}</button></li>"#
                ));
            }
            html.push_str("</ul>");
        }

        html.push_str("<ul>");
        let candidates = state.pages.get(state.page - 1).cloned().unwrap_or_default();
        for (i, _) in candidates.iter().enumerate() {
            html.push_str(&format!(
                r#"<li class="hiring-applicants__list-item" data-view-name="job-applicant-list-profile-card">
                    <a class="ember-view" href="/hiring/applicants/{}{}">Applicant</a>
                </li>"#,
                state.page, i
            ));
        }
        html.push_str("</ul>");

        if let Some(candidate) = state.selected.and_then(|i| candidates.get(i)) {
            html.push_str(&Self::render_detail(candidate, state.expanded));
        }

        html.push_str("</main></body></html>");
        html
    }

    fn render_detail(candidate: &FakeCandidate, expanded: bool) -> String {
        if candidate.scanning {
            return r#"<div class="p0 mt4 artdeco-card"><p>Scanning resume for viruses</p></div>"#
                .to_string();
        }

        let mut html = String::from("<section class=\"detail\">");
        if let Some(heading) = &candidate.heading {
            html.push_str(&format!(
                r#"<div class="hiring-applicant-header"><h1>{heading}</h1></div>"#
            ));
        }
        if let Some(href) = &candidate.resume_href {
            html.push_str(&format!(
                r#"<div class="hiring-resume-viewer__resume-wrapper--collapsed">
                    <a aria-label="Download resume" href="{href}">Download</a>
                </div>"#
            ));
        }

        html.push_str(r#"<div class="artdeco-card mt4 p0"><ul class="list-style-none mt2">"#);
        let shown = candidate
            .experiences
            .iter()
            .chain(candidate.collapsed_experiences.iter().filter(|_| expanded));
        for lines in shown {
            html.push_str(r#"<li class="display-flex align-items-center mb3">"#);
            for line in lines {
                html.push_str(&format!("<p>{line}</p>"));
            }
            html.push_str("</li>");
        }
        html.push_str("</ul>");
        if !candidate.collapsed_experiences.is_empty() && !expanded {
            html.push_str(&format!(
                r#"<button class="artdeco-button--icon-right artdeco-button--tertiary" aria-expanded="false">
                    Show {} more experiences
                </button>"#,
                candidate.collapsed_experiences.len()
            ));
        }
        html.push_str("</div>");

        html.push_str("<ul>");
        for (question, answer) in &candidate.screening {
            html.push_str(&format!(
                r#"<li class="job-posting-shared-screening-question-list__list-item">
                    <p class="t-14">{question}</p>
                    <p class="t-14 t-bold mt1">{answer}</p>
                </li>"#
            ));
        }
        html.push_str("</ul></section>");
        html
    }
}

#[async_trait]
impl PageDriver for FakeSite {
    async fn current_url(&self) -> Result<Option<String>, DriverError> {
        Ok(self.state().url.clone())
    }

    async fn content(&self) -> Result<String, DriverError> {
        let mut state = self.state();
        state.content_calls += 1;
        if state
            .fail_content_after
            .is_some_and(|limit| state.content_calls > limit)
        {
            return Err(DriverError::Protocol("target closed".to_string()));
        }
        if let Some((html, remaining)) = state.stale.as_mut() {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(html.clone());
            }
        }
        state.stale = None;
        Ok(Self::render(&state))
    }

    async fn click(&self, selector: &str, index: usize) -> Result<bool, DriverError> {
        let mut state = self.state();

        if selector == self.profile.candidate_link {
            let count = state.pages.get(state.page - 1).map_or(0, Vec::len);
            if index >= count {
                return Ok(false);
            }
            let lag = state.click_lag;
            if lag > 0 {
                let shown = Self::render(&state);
                state.stale = Some((shown, lag));
            }
            state.selected = Some(index);
            state.expanded = false;
            state.candidate_clicks += 1;
            let label = format!("candidate {}.{}", state.page, index);
            state.clicks.push(label);
            let clicks = state.candidate_clicks;
            if let Some((limit, token)) = &state.cancel_after_candidates {
                if clicks >= *limit {
                    token.cancel();
                }
            }
            return Ok(true);
        }

        if selector == self.profile.show_more_button {
            let page = state.page;
            let collapsed = state
                .selected
                .and_then(|i| state.pages[page - 1].get(i))
                .is_some_and(|c| !c.scanning && !c.collapsed_experiences.is_empty());
            if !collapsed || state.expanded {
                return Ok(false);
            }
            state.expanded = true;
            state.clicks.push("show more".to_string());
            return Ok(true);
        }

        for k in 1..=state.pages.len() {
            if selector == self.profile.page_button_for(k as u32) {
                if !state.page_buttons {
                    return Ok(false);
                }
                state.clicks.push(format!("page {k}"));
                if !state.stuck_pagination {
                    state.page = k;
                    state.selected = None;
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn reload(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        state.reloads += 1;
        state.selected = None;
        for candidate in state.pages.iter_mut().flatten() {
            candidate.scanning = false;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDownloads {
    requests: Mutex<Vec<DownloadRequest>>,
}

impl RecordingDownloads {
    pub fn take(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().drain(..).collect()
    }
}

impl DownloadSink for RecordingDownloads {
    fn send(&self, request: DownloadRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingEvents {
    pub fn take(&self) -> Vec<CrawlEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl CrawlEventSink for RecordingEvents {
    fn emit(&self, event: CrawlEvent) {
        self.events.lock().unwrap().push(event);
    }
}
