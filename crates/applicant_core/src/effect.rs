/// Side effects requested by `update`; executed by the application's effect runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Spawn one crawl cycle.
    StartCycle,
    /// Ask the running cycle to stop at its next loop boundary.
    HaltCycle,
    /// Delete the persisted start flag.
    RemoveFlag,
}
