/// How a crawl cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEnd {
    /// Every page was walked.
    Completed,
    /// A stop request was observed at a loop boundary.
    Halted,
    /// The page was reloaded to get past a resume virus scan. The start flag stays set.
    Reloaded,
    /// An error terminated the cycle; nothing was exported.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Poll timer fired; `flag_active` is the current value of the persisted start flag.
    PollTick { flag_active: bool },
    /// User asked the running crawl to stop.
    StopRequested,
    /// Engine moved to a result page.
    PageStarted { page: u32, total: u32 },
    /// Engine appended one candidate to its results.
    CandidateScraped { name: String },
    /// Engine finished the cycle.
    CycleEnded(CycleEnd),
}
