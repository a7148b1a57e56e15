use std::time::Duration;

/// Tunables of an [`Engine`](crate::Engine), fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum instances in flight. `0` means unbounded (one per item).
    pub limit: usize,
    /// Longest the coordinator blocks waiting for any instance before it
    /// re-checks cancellation.
    pub reap_interval: Duration,
    /// Pause before a looping slot retries after a crashed iteration.
    pub retry_pause: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limit: 1,
            reap_interval: Duration::from_millis(100),
            retry_pause: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Concurrency actually used for `total` items.
    #[inline]
    pub fn effective_limit(&self, total: usize) -> usize {
        if self.limit == 0 || self.limit > total {
            total
        } else {
            self.limit
        }
    }
}
