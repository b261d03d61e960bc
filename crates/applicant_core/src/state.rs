use crate::view_model::CrawlStatusView;

/// Lifecycle of the crawl in one page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrawlPhase {
    #[default]
    Idle,
    Running,
    Stopping,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrawlSession {
    phase: CrawlPhase,
    page: u32,
    total_pages: u32,
    scraped_this_cycle: usize,
    scraped_total: usize,
    cycles_started: u32,
    last_end: Option<crate::CycleEnd>,
    dirty: bool,
}

impl CrawlSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn view(&self) -> CrawlStatusView {
        CrawlStatusView {
            phase: self.phase,
            page: self.page,
            total_pages: self.total_pages,
            scraped_this_cycle: self.scraped_this_cycle,
            scraped_total: self.scraped_total,
            cycles_started: self.cycles_started,
            last_end: self.last_end.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call, and clears the marker.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.phase = CrawlPhase::Running;
        self.page = 0;
        self.total_pages = 0;
        self.scraped_this_cycle = 0;
        self.cycles_started += 1;
        self.last_end = None;
        self.dirty = true;
    }

    pub(crate) fn begin_stopping(&mut self) {
        self.phase = CrawlPhase::Stopping;
        self.dirty = true;
    }

    pub(crate) fn end_cycle(&mut self, end: crate::CycleEnd) {
        if matches!(end, crate::CycleEnd::Reloaded) {
            // The reload restarts the page context, and every held row goes with it.
            self.scraped_total = 0;
        }
        self.phase = CrawlPhase::Idle;
        self.last_end = Some(end);
        self.dirty = true;
    }

    pub(crate) fn set_page(&mut self, page: u32, total: u32) {
        self.page = page;
        self.total_pages = total;
        self.dirty = true;
    }

    pub(crate) fn record_candidate(&mut self) {
        self.scraped_this_cycle += 1;
        self.scraped_total += 1;
        self.dirty = true;
    }
}
