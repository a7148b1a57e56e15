mod looped;
mod map;

use tokio_util::sync::CancellationToken;

use crate::EngineConfig;

/// Bounded-parallelism executor.
///
/// Cloning is cheap; clones share the cancellation token, so cancelling one
/// stops dispatch on all of them.
#[derive(Debug, Clone)]
pub struct Engine {
    cfg: EngineConfig,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(cfg: EngineConfig, cancel: CancellationToken) -> Self {
        Self { cfg, cancel }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Stop dispatching new work. In-flight instances see their token cancelled
    /// and are expected to finish their current step.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
