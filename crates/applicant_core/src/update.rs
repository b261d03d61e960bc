use crate::{CrawlPhase, CrawlSession, CycleEnd, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// The caller applies messages one at a time, so the idle check and the move to
/// `Running` on a poll tick are a single step; a tick can never start a second cycle.
pub fn update(mut state: CrawlSession, msg: Msg) -> (CrawlSession, Vec<Effect>) {
    let effects = match msg {
        Msg::PollTick { flag_active } => {
            if flag_active && state.phase() == CrawlPhase::Idle {
                state.begin_cycle();
                vec![Effect::StartCycle]
            } else {
                Vec::new()
            }
        }
        Msg::StopRequested => {
            if state.phase() == CrawlPhase::Running {
                state.begin_stopping();
                vec![Effect::HaltCycle]
            } else {
                Vec::new()
            }
        }
        Msg::PageStarted { page, total } => {
            if state.phase() != CrawlPhase::Idle {
                state.set_page(page, total);
            }
            Vec::new()
        }
        Msg::CandidateScraped { name: _ } => {
            if state.phase() != CrawlPhase::Idle {
                state.record_candidate();
            }
            Vec::new()
        }
        Msg::CycleEnded(end) => {
            if state.phase() == CrawlPhase::Idle {
                return (state, Vec::new());
            }
            let keep_flag = matches!(end, CycleEnd::Reloaded);
            state.end_cycle(end);
            if keep_flag {
                Vec::new()
            } else {
                vec![Effect::RemoveFlag]
            }
        }
    };

    (state, effects)
}
