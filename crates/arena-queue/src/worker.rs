use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use arena_core::Engine;
use arena_exec::GameDriver;
use arena_model::{GameResult, GameSpec, Participant, Side, Submission, WorkItem};
use arena_observe::log_outcome;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{Calibration, Collector, QueueError, WorkerConfig};

/// Fetch, play, submit, forever.
pub struct Worker<C> {
    collector: C,
    cfg: WorkerConfig,
    calibration: Calibration,
}

impl<C: Collector + 'static> Worker<C> {
    pub fn new(collector: C, cfg: WorkerConfig, calibration: Calibration) -> Self {
        Self {
            collector,
            cfg,
            calibration,
        }
    }

    /// Side the evaluated player takes in game `game_no`.
    pub fn player_side(game_no: u64) -> Side {
        if game_no % 2 == 1 { Side::White } else { Side::Black }
    }

    /// Game descriptor for one work item, with the time budget already scaled.
    pub fn game_spec(&self, game_no: u64, item: &WorkItem) -> Result<GameSpec, QueueError> {
        let budget = self.calibration.scale(&item.time_budget()?);
        let side = Self::player_side(game_no);

        let player = Participant::new(format!("player:{}", item.player.id), self.cfg.engine.clone());
        let baseline = Participant::new(format!("baseline:{}", item.baseline.id), self.cfg.engine.clone());
        let (white, black) = match side {
            Side::White => (player, baseline),
            Side::Black => (baseline, player),
        };

        let mut spec = GameSpec::new(format!("{}-{game_no}", self.cfg.name), white, black);
        spec.setup = vec![
            budget.to_time_command(),
            format!("boardsize {}", item.size.params),
            format!("player_params {}", item.baseline.params),
        ];
        let own = vec![format!("player_params {}", item.player.params)];
        match side {
            Side::White => spec.white_setup = own,
            Side::Black => spec.black_setup = own,
        }
        spec.size = item.size.id.clone();
        spec.time_class = item.time.id.clone();
        spec.time_budget = self.cfg.game_budget;
        Ok(spec)
    }

    /// One game: fetch a work item, play it, submit the result for the player.
    ///
    /// Games without a decision are not submitted.
    pub async fn round(&self, game_no: u64, cancel: CancellationToken) -> Result<GameResult, QueueError> {
        let item = self.collector.fetch().await?;
        let spec = self.game_spec(game_no, &item)?;
        let task = spec.id.clone();
        let side = Self::player_side(game_no);

        let outcome = GameDriver::new(spec, self.cfg.session.clone()).run(cancel).await;
        log_outcome(&outcome);

        let decided = outcome.game().filter(|_| outcome.is_decided()).and_then(|g| g.winner.map(|w| (w, g)));
        let Some((winner, game)) = decided else {
            return Err(QueueError::Undecided {
                task,
                status: outcome.status,
                reason: outcome.reason.clone().unwrap_or_default(),
            });
        };

        let result = winner.result_for(side);
        self.collector.submit(&Submission::new(&item, result, game.log.clone())).await?;
        info!(
            target: "arena.queue.worker",
            %task,
            player = %item.player.id,
            baseline = %item.baseline.id,
            outcome = result.code(),
            "game submitted"
        );
        Ok(result)
    }

    /// Run rounds in every engine slot until the engine is cancelled.
    pub async fn run(self, engine: &Engine) {
        let worker = Arc::new(self);
        let games = Arc::new(AtomicU64::new(0));
        let retry = worker.cfg.retry_delay;

        info!(target: "arena.queue.worker", name = %worker.cfg.name, factor = worker.calibration.factor, "worker started");
        engine
            .run_loop(move |slot, cancel| {
                let worker = Arc::clone(&worker);
                let game_no = games.fetch_add(1, Ordering::Relaxed) + 1;
                async move {
                    if let Err(e) = worker.round(game_no, cancel.clone()).await {
                        warn!(target: "arena.queue.worker", slot, game_no, error = %e, "round failed; retrying");
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = tokio::time::sleep(retry) => {}
                        }
                    }
                }
            })
            .await;
        info!(target: "arena.queue.worker", "worker stopped");
    }
}
