//! `watch`: polls the start flag, feeds the state machine and carries out its effects.

use std::sync::Arc;

use anyhow::{Context, Result};
use applicant_core::{update, CrawlPhase, CrawlSession, CycleEnd, Effect, Msg};
use applicant_engine::{
    clear_crawl_request, crawl_requested, ApplicantSite, ChromeDriver, CrawlEvent,
    CrawlEventSink, Crawler, CycleOutcome, DownloadRelay, FileFlagStore, FlagStore,
    LocalStorageFlagStore, PageDriver, RelayEvent,
};
use crawl_logging::{crawl_debug, crawl_info, crawl_warn};
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::browser;
use crate::config::{CrawlerConfig, FlagBackend};

pub async fn run(config: &CrawlerConfig) -> Result<()> {
    let relay = Arc::new(
        DownloadRelay::spawn(config.relay_settings()).context("starting download relay")?,
    );

    let mut session = browser::open(config).await?;
    let page = session
        .working_page(config.browser.start_url.as_deref())
        .await?
        .context("no browser tab to crawl; open the applicants page or set browser.start_url")?;
    let driver = ChromeDriver::new(page);

    let flags: Arc<dyn FlagStore> = match &config.flag_store {
        FlagBackend::Page => Arc::new(LocalStorageFlagStore::new(driver.page().clone())),
        FlagBackend::File(path) => Arc::new(FileFlagStore::new(path)),
    };
    let cookies = config.relay.forward_cookies.then(|| CookieForwarding {
        driver: driver.clone(),
        relay: relay.clone(),
    });

    let page_driver: Arc<dyn PageDriver> = Arc::new(driver);
    let site = ApplicantSite::new(page_driver, config.site.clone()).context("invalid site profile")?;
    let crawler = Crawler::new(site, relay.clone(), config.crawl_settings());

    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let mut poller = Poller::new(crawler, flags, cookies, msg_tx);
    let mut ticker = tokio::time::interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tally = RelayTally::default();

    crawl_info!("Watching for the start flag; press Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = ticker.tick() => poller.poll_flag().await,
            Some(msg) = msg_rx.recv() => poller.dispatch(msg).await,
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    crawl_warn!("Could not listen for Ctrl-C: {}", err);
                    break;
                }
                if !poller.interrupt().await {
                    break;
                }
            }
        }
        while let Some(event) = relay.try_recv() {
            tally.record(&event);
        }
    }

    poller.abandon();
    let relay_for_shutdown = relay.clone();
    tokio::task::spawn_blocking(move || relay_for_shutdown.shutdown())
        .await
        .context("waiting for downloads to finish")?;
    while let Some(event) = relay.try_recv() {
        tally.record(&event);
    }
    crawl_info!(
        "Stopped. {} download(s) saved, {} failed",
        tally.saved,
        tally.failed
    );
    Ok(())
}

/// Copies the crawled tab's cookies onto the relay before each cycle.
pub struct CookieForwarding {
    driver: ChromeDriver,
    relay: Arc<DownloadRelay>,
}

impl CookieForwarding {
    async fn refresh(&self) {
        match self.driver.cookie_header().await {
            Ok(header) => self.relay.set_cookie_header(header),
            Err(err) => crawl_warn!("Could not read tab cookies: {}", err),
        }
    }
}

/// Single owner of the crawl session state; messages are applied one at a time.
pub struct Poller {
    state: CrawlSession,
    effects: EffectRunner,
    flags: Arc<dyn FlagStore>,
}

impl Poller {
    pub fn new(
        crawler: Crawler,
        flags: Arc<dyn FlagStore>,
        cookies: Option<CookieForwarding>,
        msg_tx: mpsc::UnboundedSender<Msg>,
    ) -> Self {
        Self {
            state: CrawlSession::new(),
            effects: EffectRunner {
                crawler: Arc::new(Mutex::new(crawler)),
                flags: flags.clone(),
                cookies: cookies.map(Arc::new),
                msg_tx,
                cancel: CancellationToken::new(),
            },
            flags,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.state.phase()
    }

    /// Reads the flag and feeds the result in as a tick. Read errors count as "not set".
    pub async fn poll_flag(&mut self) {
        let flag_active = match crawl_requested(self.flags.as_ref()).await {
            Ok(active) => active,
            Err(err) => {
                crawl_warn!("Could not read the start flag: {}", err);
                false
            }
        };
        self.dispatch(Msg::PollTick { flag_active }).await;
    }

    pub async fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            crawl_info!("{}", state.view().summary());
        }
        self.state = state;
        self.effects.apply(effects).await;
    }

    /// Handles Ctrl-C. Returns `false` when the process should exit.
    pub async fn interrupt(&mut self) -> bool {
        match self.phase() {
            CrawlPhase::Idle => false,
            CrawlPhase::Running => {
                crawl_info!("Stop requested; finishing the current candidate");
                self.dispatch(Msg::StopRequested).await;
                true
            }
            CrawlPhase::Stopping => {
                crawl_warn!("Interrupted again; abandoning the running cycle");
                false
            }
        }
    }

    /// Cancels any running cycle without waiting for it.
    pub fn abandon(&self) {
        self.effects.cancel.cancel();
    }
}

struct EffectRunner {
    crawler: Arc<Mutex<Crawler>>,
    flags: Arc<dyn FlagStore>,
    cookies: Option<Arc<CookieForwarding>>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    cancel: CancellationToken,
}

impl EffectRunner {
    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartCycle => self.start_cycle(),
                Effect::HaltCycle => self.cancel.cancel(),
                Effect::RemoveFlag => {
                    // Awaited so the next tick cannot see a stale flag and restart.
                    if let Err(err) = clear_crawl_request(self.flags.as_ref()).await {
                        crawl_warn!("Could not clear the start flag: {}", err);
                    }
                }
            }
        }
    }

    fn start_cycle(&mut self) {
        self.cancel = CancellationToken::new();
        let cancel = self.cancel.clone();
        let crawler = self.crawler.clone();
        let cookies = self.cookies.clone();
        let msg_tx = self.msg_tx.clone();

        tokio::spawn(async move {
            if let Some(cookies) = cookies {
                cookies.refresh().await;
            }
            let events = MsgEvents {
                msg_tx: msg_tx.clone(),
            };
            let outcome = crawler.lock().await.run_cycle(&cancel, &events).await;
            crawl_debug!("Cycle finished: {:?}", outcome);
            let _ = msg_tx.send(Msg::CycleEnded(map_outcome(outcome)));
        });
    }
}

/// Forwards crawl progress into the message loop.
struct MsgEvents {
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl CrawlEventSink for MsgEvents {
    fn emit(&self, event: CrawlEvent) {
        let msg = match event {
            CrawlEvent::PageStarted { page, total } => Msg::PageStarted { page, total },
            CrawlEvent::CandidateScraped { name } => Msg::CandidateScraped { name },
        };
        let _ = self.msg_tx.send(msg);
    }
}

fn map_outcome(outcome: CycleOutcome) -> CycleEnd {
    match outcome {
        CycleOutcome::Completed => CycleEnd::Completed,
        CycleOutcome::Halted => CycleEnd::Halted,
        CycleOutcome::Reloaded => CycleEnd::Reloaded,
        CycleOutcome::Failed(reason) => CycleEnd::Failed(reason),
    }
}

#[derive(Debug, Default)]
struct RelayTally {
    saved: usize,
    failed: usize,
}

impl RelayTally {
    fn record(&mut self, event: &RelayEvent) {
        match event {
            RelayEvent::Saved { .. } => self.saved += 1,
            RelayEvent::Failed { .. } => self.failed += 1,
            RelayEvent::Ignored => {}
        }
    }
}
