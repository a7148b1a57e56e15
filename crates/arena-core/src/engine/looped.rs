use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{Engine, panic_message};

impl Engine {
    /// Keep `limit` slots busy until cancelled.
    ///
    /// Every slot runs `f(slot, token)` back to back. A crashed iteration is
    /// logged and retried after `retry_pause`; it never stops the other slots.
    /// Returns once every slot has observed cancellation and its current
    /// iteration has finished.
    pub async fn run_loop<F, Fut>(&self, f: F)
    where
        F: Fn(usize, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let slots = self.cfg.limit.max(1);
        let f = std::sync::Arc::new(f);
        info!(target: "arena.core.loop", slots, "loop started");

        let mut set = JoinSet::new();
        for slot in 0..slots {
            let f = std::sync::Arc::clone(&f);
            let cancel = self.cancel.clone();
            let pause = self.cfg.retry_pause;
            set.spawn(async move {
                let mut iterations = 0u64;
                while !cancel.is_cancelled() {
                    let iteration = tokio::spawn(f(slot, cancel.child_token()));
                    iterations += 1;
                    if let Err(e) = iteration.await {
                        let reason = if e.is_panic() {
                            panic_message(&*e.into_panic())
                        } else {
                            e.to_string()
                        };
                        error!(target: "arena.core.loop", slot, %reason, "iteration crashed; retrying");
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(pause) => {}
                        }
                    }
                }
                debug!(target: "arena.core.loop", slot, iterations, "slot stopped");
            });
        }

        while set.join_next().await.is_some() {}
        info!(target: "arena.core.loop", "loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use super::*;
    use crate::EngineConfig;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slots_run_until_cancelled() {
        let cfg = EngineConfig {
            limit: 3,
            retry_pause: Duration::from_millis(5),
            ..EngineConfig::default()
        };
        let engine = Engine::new(cfg, CancellationToken::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(std::sync::Mutex::new(std::collections::BTreeSet::new()));

        let stopper = engine.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            stopper.cancel();
        });

        let counter = Arc::clone(&runs);
        let slots_seen = Arc::clone(&seen);
        tokio::time::timeout(
            Duration::from_secs(5),
            engine.run_loop(move |slot, _| {
                let counter = Arc::clone(&counter);
                let slots_seen = Arc::clone(&slots_seen);
                async move {
                    slots_seen.lock().unwrap().insert(slot);
                    counter.fetch_add(1, Ordering::SeqCst);
                    if slot == 1 {
                        panic!("slot one always crashes");
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }),
        )
        .await
        .expect("loop should stop after cancel");

        assert!(runs.load(Ordering::SeqCst) >= 3);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn cancelled_before_start_runs_nothing() {
        let engine = Engine::new(EngineConfig::with_limit(2), CancellationToken::new());
        engine.cancel();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        engine
            .run_loop(move |_, _| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
