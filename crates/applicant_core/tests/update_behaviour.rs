use std::sync::Once;

use applicant_core::{update, CrawlPhase, CrawlSession, CycleEnd, Effect, Msg};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(crawl_logging::initialize_for_tests);
}

fn running() -> CrawlSession {
    let (state, effects) = update(CrawlSession::new(), Msg::PollTick { flag_active: true });
    assert_eq!(effects, vec![Effect::StartCycle]);
    state
}

#[test]
fn tick_without_flag_stays_idle() {
    init_logging();
    let (mut state, effects) = update(CrawlSession::new(), Msg::PollTick { flag_active: false });

    assert_eq!(state.phase(), CrawlPhase::Idle);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn tick_with_flag_starts_one_cycle() {
    init_logging();
    let mut state = running();

    assert_eq!(state.phase(), CrawlPhase::Running);
    assert_eq!(state.view().cycles_started, 1);
    assert!(state.consume_dirty());
}

#[test]
fn ticks_while_running_do_not_restart() {
    init_logging();
    let state = running();

    let (state, effects) = update(state, Msg::PollTick { flag_active: true });
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::PollTick { flag_active: true });
    assert!(effects.is_empty());

    assert_eq!(state.phase(), CrawlPhase::Running);
    assert_eq!(state.view().cycles_started, 1);
}

#[test]
fn stop_moves_running_to_stopping_and_halts() {
    init_logging();
    let state = running();
    let (state, effects) = update(state, Msg::StopRequested);

    assert_eq!(state.phase(), CrawlPhase::Stopping);
    assert_eq!(effects, vec![Effect::HaltCycle]);

    // A second request while stopping is ignored.
    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(state.phase(), CrawlPhase::Stopping);
    assert!(effects.is_empty());
}

#[test]
fn stop_while_idle_is_ignored() {
    init_logging();
    let (state, effects) = update(CrawlSession::new(), Msg::StopRequested);

    assert_eq!(state.phase(), CrawlPhase::Idle);
    assert!(effects.is_empty());
}

#[test]
fn ticks_while_stopping_do_not_restart() {
    init_logging();
    let (state, _) = update(running(), Msg::StopRequested);
    let (state, effects) = update(state, Msg::PollTick { flag_active: true });

    assert_eq!(state.phase(), CrawlPhase::Stopping);
    assert!(effects.is_empty());
}

#[test]
fn completed_cycle_removes_flag_and_returns_to_idle() {
    init_logging();
    let (state, effects) = update(running(), Msg::CycleEnded(CycleEnd::Completed));

    assert_eq!(state.phase(), CrawlPhase::Idle);
    assert_eq!(effects, vec![Effect::RemoveFlag]);
    assert_eq!(state.view().last_end, Some(CycleEnd::Completed));
}

#[test]
fn halted_and_failed_cycles_remove_flag() {
    init_logging();
    let (state, _) = update(running(), Msg::StopRequested);
    let (state, effects) = update(state, Msg::CycleEnded(CycleEnd::Halted));
    assert_eq!(state.phase(), CrawlPhase::Idle);
    assert_eq!(effects, vec![Effect::RemoveFlag]);

    let (state, _) = update(state, Msg::PollTick { flag_active: true });
    let (state, effects) = update(state, Msg::CycleEnded(CycleEnd::Failed("boom".into())));
    assert_eq!(state.phase(), CrawlPhase::Idle);
    assert_eq!(effects, vec![Effect::RemoveFlag]);
}

#[test]
fn reload_keeps_flag_so_next_tick_restarts() {
    init_logging();
    let (state, effects) = update(running(), Msg::CycleEnded(CycleEnd::Reloaded));
    assert_eq!(state.phase(), CrawlPhase::Idle);
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::PollTick { flag_active: true });
    assert_eq!(state.phase(), CrawlPhase::Running);
    assert_eq!(effects, vec![Effect::StartCycle]);
    assert_eq!(state.view().cycles_started, 2);
}

#[test]
fn reload_discards_every_held_row() {
    init_logging();
    let (state, _) = update(running(), Msg::CandidateScraped { name: "A".into() });
    let (state, _) = update(state, Msg::CycleEnded(CycleEnd::Completed));
    let (state, _) = update(state, Msg::PollTick { flag_active: true });
    let (state, _) = update(state, Msg::CandidateScraped { name: "B".into() });
    let (state, _) = update(state, Msg::CandidateScraped { name: "C".into() });
    assert_eq!(state.view().scraped_total, 3);

    let (state, _) = update(state, Msg::CycleEnded(CycleEnd::Reloaded));
    assert_eq!(state.view().scraped_total, 0);
}

#[test]
fn progress_is_tracked_while_running() {
    init_logging();
    let (state, _) = update(running(), Msg::PageStarted { page: 2, total: 5 });
    let (state, _) = update(state, Msg::CandidateScraped { name: "Jane Doe".into() });
    let (state, _) = update(state, Msg::CandidateScraped { name: "John Roe".into() });

    let view = state.view();
    assert_eq!(view.page, 2);
    assert_eq!(view.total_pages, 5);
    assert_eq!(view.scraped_this_cycle, 2);
    assert_eq!(view.summary(), "crawling page 2/5, 2 candidates this cycle");
}

#[test]
fn late_engine_messages_after_idle_are_ignored() {
    init_logging();
    let (state, _) = update(running(), Msg::CycleEnded(CycleEnd::Completed));
    let (state, effects) = update(state, Msg::CycleEnded(CycleEnd::Completed));
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::CandidateScraped { name: "late".into() });
    assert_eq!(state.view().scraped_total, 0);
}

#[test]
fn idle_summary_mentions_last_outcome() {
    init_logging();
    assert_eq!(
        CrawlSession::new().view().summary(),
        "idle, waiting for start flag"
    );

    let (state, _) = update(running(), Msg::CandidateScraped { name: "A".into() });
    let (state, _) = update(state, Msg::CycleEnded(CycleEnd::Failed("timeout".into())));
    assert_eq!(
        state.view().summary(),
        "idle after cycle 1 (failed: timeout), 1 candidates held"
    );
}
