//! Applicant crawler core: pure crawl-session state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{CycleEnd, Msg};
pub use state::{CrawlPhase, CrawlSession};
pub use update::update;
pub use view_model::CrawlStatusView;
