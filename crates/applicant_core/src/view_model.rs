use crate::{CrawlPhase, CycleEnd};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrawlStatusView {
    pub phase: CrawlPhase,
    pub page: u32,
    pub total_pages: u32,
    pub scraped_this_cycle: usize,
    /// Rows held by the engine; results are kept across cycles.
    pub scraped_total: usize,
    pub cycles_started: u32,
    pub last_end: Option<CycleEnd>,
    pub dirty: bool,
}

impl CrawlStatusView {
    /// One-line summary for the status log.
    pub fn summary(&self) -> String {
        match self.phase {
            CrawlPhase::Idle => match &self.last_end {
                Some(end) => format!(
                    "idle after cycle {} ({}), {} candidates held",
                    self.cycles_started,
                    describe_end(end),
                    self.scraped_total
                ),
                None => "idle, waiting for start flag".to_string(),
            },
            CrawlPhase::Running | CrawlPhase::Stopping => {
                let verb = if self.phase == CrawlPhase::Running {
                    "crawling"
                } else {
                    "stopping"
                };
                format!(
                    "{verb} page {}/{}, {} candidates this cycle",
                    self.page, self.total_pages, self.scraped_this_cycle
                )
            }
        }
    }
}

fn describe_end(end: &CycleEnd) -> String {
    match end {
        CycleEnd::Completed => "completed".to_string(),
        CycleEnd::Halted => "halted".to_string(),
        CycleEnd::Reloaded => "reloaded for virus scan".to_string(),
        CycleEnd::Failed(reason) => format!("failed: {reason}"),
    }
}
