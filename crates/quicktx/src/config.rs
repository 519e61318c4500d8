use crate::error::{QuickTxError, Result};
use std::time::Duration;

/// Worker tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfig {
    /// Transmit attempts allowed per submit while the ring is being drained.
    pub submit_budget: u32,
    /// Attempts allowed when flushing queued frames before going to sleep.
    pub sleep_budget: u32,
    /// Every Nth submit reclaims completed frames from the wait list.
    pub reclaim_interval: u32,
    /// Upper bound on live wrappers. `None` allocates on demand.
    pub pool_capacity: Option<usize>,
    /// How long a sleeping worker with unfinished frames waits before it
    /// looks at them again.
    pub idle_backoff: Duration,
    /// Pause between reclaim attempts during the shutdown drain.
    pub drain_backoff: Duration,
    /// Reclaim attempts before the drain gives up on outstanding frames.
    pub drain_max_attempts: u32,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            submit_budget: 512,
            sleep_budget: 1,
            reclaim_interval: 100,
            pool_capacity: None,
            idle_backoff: Duration::from_millis(1),
            drain_backoff: Duration::from_secs(1),
            drain_max_attempts: 30,
        }
    }
}

impl TxConfig {
    pub fn submit_budget(mut self, budget: u32) -> Self {
        self.submit_budget = budget;
        self
    }

    pub fn sleep_budget(mut self, budget: u32) -> Self {
        self.sleep_budget = budget;
        self
    }

    pub fn reclaim_interval(mut self, interval: u32) -> Self {
        self.reclaim_interval = interval;
        self
    }

    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = Some(capacity);
        self
    }

    pub fn idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    pub fn drain_backoff(mut self, backoff: Duration) -> Self {
        self.drain_backoff = backoff;
        self
    }

    pub fn drain_max_attempts(mut self, attempts: u32) -> Self {
        self.drain_max_attempts = attempts;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.submit_budget == 0 {
            return Err(QuickTxError::InvalidConfiguration("submit_budget must be non-zero".into()));
        }
        if self.sleep_budget == 0 {
            return Err(QuickTxError::InvalidConfiguration("sleep_budget must be non-zero".into()));
        }
        if self.reclaim_interval == 0 {
            return Err(QuickTxError::InvalidConfiguration("reclaim_interval must be non-zero".into()));
        }
        if self.pool_capacity == Some(0) {
            return Err(QuickTxError::InvalidConfiguration("pool_capacity must be non-zero".into()));
        }
        if self.drain_max_attempts == 0 {
            return Err(QuickTxError::InvalidConfiguration("drain_max_attempts must be non-zero".into()));
        }
        Ok(())
    }
}
