//! Readiness polling: wait until the page reflects the action that was just taken.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::driver::DriverError;

/// Bounded exponential backoff for readiness probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Give up once this much time has passed since the first probe.
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl ReadinessPolicy {
    /// Delay before probe `attempt + 1`; `attempt` is 1-based.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(exp).min(self.max_backoff)
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: &'static str, waited: Duration },
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Probes until `probe` returns `true`.
pub async fn wait_until<F, Fut>(
    policy: &ReadinessPolicy,
    what: &'static str,
    mut probe: F,
) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, DriverError>>,
{
    let started = Instant::now();
    let mut attempt = 0;
    loop {
        if probe().await? {
            return Ok(());
        }
        attempt += 1;
        pause(policy, what, started, attempt).await?;
    }
}

/// Probes until two consecutive probes return the same `Some` value, and returns it.
///
/// Used where "ready" means "finished re-rendering" rather than a single marker.
pub async fn wait_for_stable<T, F, Fut>(
    policy: &ReadinessPolicy,
    what: &'static str,
    mut probe: F,
) -> Result<T, WaitError>
where
    T: PartialEq,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DriverError>>,
{
    let started = Instant::now();
    let mut attempt = 0;
    let mut previous: Option<T> = None;
    loop {
        match probe().await? {
            Some(current) => {
                if previous.as_ref() == Some(&current) {
                    return Ok(current);
                }
                previous = Some(current);
            }
            None => previous = None,
        }
        attempt += 1;
        pause(policy, what, started, attempt).await?;
    }
}

async fn pause(
    policy: &ReadinessPolicy,
    what: &'static str,
    started: Instant,
    attempt: u32,
) -> Result<(), WaitError> {
    let waited = started.elapsed();
    if waited >= policy.timeout {
        return Err(WaitError::Timeout { what, waited });
    }
    let delay = policy.backoff(attempt).min(policy.timeout - waited);
    tokio::time::sleep(delay).await;
    Ok(())
}
