use std::{
    fmt::Write as _,
    time::{Duration, Instant},
};

use arena_core::{Engine, SlotError};
use arena_exec::{GameDriver, SessionConfig};
use arena_model::{GameRecord, GameSpec, Outcome, Participant, Payload};
use arena_report::{Aggregate, WinMatrix};
use tracing::{info, warn};

use crate::{Pairing, RunnerError, Schedule};

#[derive(Debug, Clone)]
pub struct TournamentConfig {
    pub players: Vec<Participant>,
    pub rounds: usize,
    /// Player 0 against the field instead of a full round robin.
    pub against: bool,
    /// Seconds per game handed to the engines; `0` leaves it unset.
    pub time_per_game: f64,
    pub time_per_move: f64,
    /// Simulation cap per move; `0` leaves it unset.
    pub max_runs: u64,
    /// `0` leaves the engines' default.
    pub boardsize: u32,
    /// Sent to both engines after the derived commands.
    pub extra_commands: Vec<String>,
    /// Label used for aggregation.
    pub time_class: String,
    /// Wall-clock cap per game enforced by the driver.
    pub game_budget: Option<Duration>,
    pub max_moves: Option<u32>,
    pub session: SessionConfig,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            rounds: 1,
            against: false,
            time_per_game: 0.0,
            time_per_move: 0.0,
            max_runs: 0,
            boardsize: 0,
            extra_commands: Vec::new(),
            time_class: String::new(),
            game_budget: None,
            max_moves: None,
            session: SessionConfig::default(),
        }
    }
}

impl TournamentConfig {
    /// Commands every engine receives before the first move.
    pub fn setup_commands(&self) -> Vec<String> {
        let mut cmds = Vec::new();
        if self.time_per_game > 0.0 || self.time_per_move > 0.0 || self.max_runs > 0 {
            cmds.push(format!(
                "time -g {} -m {} -i {} -f 0",
                self.time_per_game, self.time_per_move, self.max_runs
            ));
        }
        if self.boardsize > 0 {
            cmds.push(format!("boardsize {}", self.boardsize));
        }
        cmds.extend(self.extra_commands.iter().cloned());
        cmds
    }
}

#[derive(Debug, Clone)]
pub struct TournamentReport {
    pub games: Vec<Pairing>,
    /// One outcome per game, in schedule order.
    pub outcomes: Vec<Outcome>,
    pub matrix: WinMatrix,
    pub aggregate: Aggregate,
    pub elapsed: Duration,
}

impl TournamentReport {
    pub fn render(&self, names: &[String]) -> String {
        let mut out = self.matrix.render(names);
        let _ = writeln!(
            out,
            "Played {} games, Total Time: {} s",
            self.games.len(),
            self.elapsed.as_secs()
        );
        if self.aggregate.errors > 0 || self.aggregate.unfinished > 0 {
            let _ = writeln!(
                out,
                "{} games failed, {} ended without a result",
                self.aggregate.errors, self.aggregate.unfinished
            );
        }
        out
    }
}

/// Plays a schedule of games through the engine and tallies the results.
pub struct Tournament {
    cfg: TournamentConfig,
}

impl Tournament {
    pub fn new(cfg: TournamentConfig) -> Self {
        Self { cfg }
    }

    pub fn schedule(&self) -> Schedule {
        let n = self.cfg.players.len();
        if self.cfg.against {
            Schedule::against(n, self.cfg.rounds)
        } else {
            Schedule::round_robin(n, self.cfg.rounds)
        }
    }

    fn game_spec(&self, game: &Pairing, setup: &[String]) -> GameSpec {
        let cfg = &self.cfg;
        let mut spec = GameSpec::new(
            format!("game-{}", game.number),
            cfg.players[game.white].clone(),
            cfg.players[game.black].clone(),
        );
        spec.setup = setup.to_vec();
        spec.size = cfg.boardsize.to_string();
        spec.time_class = cfg.time_class.clone();
        spec.time_budget = cfg.game_budget;
        spec.max_moves = cfg.max_moves;
        spec
    }

    pub async fn run(&self, engine: &Engine) -> Result<TournamentReport, RunnerError> {
        let n = self.cfg.players.len();
        if n < 2 {
            return Err(RunnerError::NotEnoughPlayers(n));
        }

        let started = Instant::now();
        let schedule = self.schedule();
        let setup = self.cfg.setup_commands();
        info!(
            target: "arena.runner.tournament",
            players = n,
            games = schedule.len(),
            parallel = engine.config().limit,
            "tournament started"
        );

        let specs: Vec<GameSpec> = schedule.games.iter().map(|g| self.game_spec(g, &setup)).collect();
        let session = self.cfg.session.clone();
        let results = engine
            .map(specs.clone(), |spec, token| {
                let driver = GameDriver::new(spec, session.clone());
                async move { driver.run(token).await }
            })
            .await;

        let outcomes: Vec<Outcome> = results
            .into_iter()
            .zip(&specs)
            .map(|(result, spec)| result.unwrap_or_else(|e| crashed_game(spec, e)))
            .collect();

        let mut matrix = WinMatrix::new(n);
        for (game, outcome) in schedule.games.iter().zip(&outcomes) {
            let winner = outcome.game().and_then(|g| g.winner);
            matrix.record(game.white, game.black, winner);
        }
        let aggregate = Aggregate::fold(&outcomes);
        let elapsed = started.elapsed();

        info!(
            target: "arena.runner.tournament",
            games = outcomes.len(),
            errors = aggregate.errors,
            unfinished = aggregate.unfinished,
            elapsed_secs = elapsed.as_secs(),
            "tournament finished"
        );
        Ok(TournamentReport {
            games: schedule.games,
            outcomes,
            matrix,
            aggregate,
            elapsed,
        })
    }
}

fn crashed_game(spec: &GameSpec, e: SlotError) -> Outcome {
    warn!(target: "arena.runner.tournament", task = %spec.id, error = %e, "game produced no outcome");
    let record = GameRecord {
        white: spec.white.name.clone(),
        black: spec.black.name.clone(),
        size: spec.size.clone(),
        time_class: spec.time_class.clone(),
        winner: None,
        moves: 0,
        log: String::new(),
    };
    Outcome::error(&spec.id, Duration::ZERO, Payload::Game(record), e.to_string())
}
