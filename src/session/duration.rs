use std::time::Duration;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

/// Tick period for the duration backstop. Coarse enough to be negligible
/// load; accuracy does not depend on it because elapsed time is a monotonic
/// delta, not a tick count.
pub(crate) const TICK_PERIOD: Duration = Duration::from_millis(250);

/// Cooperative timer bounding call length, independent of the remote engine's
/// own time awareness. The call ends even if the agent never stops itself.
///
/// Elapsed time is measured from a monotonic start instant on every tick, so
/// the reading cannot drift under scheduling jitter; whole seconds come from
/// integer division of the delta.
pub struct DurationEnforcer {
    started: Instant,
    limit: Duration,
    ticker: Interval,
}

impl DurationEnforcer {
    pub fn start(minutes: u64) -> Self {
        let mut ticker = interval(TICK_PERIOD);
        // Late ticks must not bunch up into a burst of catch-up polls.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            started: Instant::now(),
            limit: Duration::from_secs(minutes * 60),
            ticker,
        }
    }

    /// Wait for the next tick and report elapsed whole seconds.
    pub async fn tick(&mut self) -> u64 {
        self.ticker.tick().await;
        self.elapsed_seconds()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn expired(&self) -> bool {
        self.elapsed_seconds() >= self.limit.as_secs()
    }
}
