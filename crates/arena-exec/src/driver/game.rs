use std::{fmt::Write as _, time::Instant};

use arena_model::{GameRecord, GameSpec, Outcome, Payload, Side, Winner};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{DriverState, Progress, Verdict};
use crate::{Session, SessionConfig};

/// Plays one game between two engine sessions, relaying every move.
#[derive(Debug, Clone)]
pub struct GameDriver {
    spec: GameSpec,
    cfg: SessionConfig,
}

struct Seats {
    white: Session,
    black: Session,
}

impl Seats {
    fn get(&mut self, side: Side) -> &mut Session {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}

impl GameDriver {
    pub fn new(spec: GameSpec, cfg: SessionConfig) -> Self {
        Self { spec, cfg }
    }

    pub fn spec(&self) -> &GameSpec {
        &self.spec
    }

    /// Play the game to an outcome. Both engines are stopped before this returns.
    pub async fn run(&self, cancel: CancellationToken) -> Outcome {
        let started = Instant::now();
        let spec = &self.spec;
        let mut progress = Progress::start(&spec.id);
        let mut record = GameRecord {
            white: spec.white.name.clone(),
            black: spec.black.name.clone(),
            size: spec.size.clone(),
            time_class: spec.time_class.clone(),
            winner: None,
            moves: 0,
            log: String::new(),
        };

        let white = match Session::open(format!("{}/white", spec.id), &spec.white.command, &self.cfg) {
            Ok(s) => s,
            Err(e) => {
                return Outcome::error(&spec.id, started.elapsed(), Payload::Game(record), format!("white: {e}"));
            }
        };
        let black = match Session::open(format!("{}/black", spec.id), &spec.black.command, &self.cfg) {
            Ok(s) => s,
            Err(e) => {
                progress.enter(DriverState::Cleanup);
                close_quietly(white).await;
                return Outcome::error(&spec.id, started.elapsed(), Payload::Game(record), format!("black: {e}"));
            }
        };
        let mut seats = Seats { white, black };

        let verdict = self.play(&mut seats, &mut record, &mut progress, &cancel, started).await;

        progress.enter(DriverState::Cleanup);
        let Seats { white, black } = seats;
        tokio::join!(close_quietly(white), close_quietly(black));

        let elapsed = started.elapsed();
        match verdict {
            Verdict::Decided(winner) => {
                record.winner = Some(winner);
                let _ = writeln!(record.log, "# Winner: {winner}");
                let _ = writeln!(record.log, "# Total time: {:.3} seconds", elapsed.as_secs_f64());
                info!(target: "arena.exec.driver", task = %spec.id, %winner, moves = record.moves, "game decided");
                Outcome::decided(&spec.id, elapsed, Payload::Game(record))
            }
            Verdict::NoResult(reason) => Outcome::no_result(&spec.id, elapsed, Payload::Game(record), reason),
            Verdict::Error(reason) => {
                warn!(target: "arena.exec.driver", task = %spec.id, state = %progress.state(), %reason, "game failed");
                Outcome::error(&spec.id, elapsed, Payload::Game(record), reason)
            }
        }
    }

    async fn play(
        &self,
        seats: &mut Seats,
        record: &mut GameRecord,
        progress: &mut Progress<'_>,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Verdict<Winner> {
        let spec = &self.spec;
        let dialect = &self.cfg.dialect;

        progress.enter(DriverState::Setup);
        for cmd in &spec.setup {
            for side in [Side::White, Side::Black] {
                let reply = seats.get(side).send(cmd).await;
                if !reply.is_success() {
                    return Verdict::Error(format!("{side} rejected `{cmd}`: {}", reply.payload));
                }
            }
            let _ = writeln!(record.log, "{}", cmd.trim());
        }
        for (side, cmds) in [(Side::White, &spec.white_setup), (Side::Black, &spec.black_setup)] {
            for cmd in cmds {
                let reply = seats.get(side).send(cmd).await;
                if !reply.is_success() {
                    return Verdict::Error(format!("{side} rejected `{cmd}`: {}", reply.payload));
                }
            }
        }

        progress.enter(DriverState::Exchange);
        let mut turn = Side::White;
        loop {
            if cancel.is_cancelled() {
                return Verdict::NoResult("cancelled".into());
            }
            if spec.max_moves.is_some_and(|max| record.moves >= max) {
                return Verdict::NoResult(format!("move limit of {} reached", record.moves));
            }
            if spec.time_budget.is_some_and(|budget| started.elapsed() >= budget) {
                return Verdict::NoResult("time budget exhausted".into());
            }

            let asked = Instant::now();
            let reply = seats.get(turn).send(&dialect.genmove_cmd(turn)).await;
            let took = asked.elapsed();
            if !reply.is_success() {
                return Verdict::Error(format!("{turn} genmove failed: {}", reply.payload));
            }

            let mv = reply.payload.trim();
            if dialect.is_resign(mv) {
                let _ = writeln!(record.log, "# {turn} resigns");
                return Verdict::Decided(Winner::side(turn.other()));
            }
            if dialect.is_no_move(mv) {
                break;
            }
            if mv.is_empty() || mv.contains(char::is_whitespace) {
                return Verdict::Error(format!("{turn} returned an unreadable move `{mv}`"));
            }

            let play = dialect.play_cmd(turn, mv);
            let relay = seats.get(turn.other()).send(&play).await;
            if !relay.is_success() {
                return Verdict::Error(format!("{} rejected `{play}`: {}", turn.other(), relay.payload));
            }

            record.moves += 1;
            let _ = writeln!(record.log, "{play}");
            let _ = writeln!(record.log, "# took {:.3} seconds\n", took.as_secs_f64());
            turn = turn.other();
        }

        progress.enter(DriverState::Terminal);
        let reply = seats.white.send(&dialect.winner).await;
        if !reply.is_success() {
            return Verdict::Error(format!("`{}` failed: {}", dialect.winner, reply.payload));
        }
        match reply.payload.parse::<Winner>() {
            Ok(winner) => Verdict::Decided(winner),
            Err(e) => Verdict::Error(e.to_string()),
        }
    }
}

async fn close_quietly(session: Session) {
    let name = session.name().to_string();
    if let Err(e) = session.close().await {
        warn!(target: "arena.exec.driver", session = %name, error = %e, "close failed");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use arena_model::{EngineCommand, OutcomeStatus, Participant};

    use super::*;

    fn engine(body: &str) -> Participant {
        Participant::new("sh", EngineCommand::new("sh").with_args(["-c", body]))
    }

    /// Plays `a1`, `a2`, ... and answers `none` once it has made `$1` moves.
    fn counting(moves: u32, winner: &str) -> String {
        format!(
            r#"
n=0
while read -r cmd rest; do
  case "$cmd" in
    quit) printf '= \n\n'; exit 0 ;;
    genmove) n=$((n+1)); if [ $n -gt {moves} ]; then printf '= none\n\n'; else printf '= a%s\n\n' $n; fi ;;
    havannah_winner) printf '= {winner}\n\n' ;;
    *) printf '= \n\n' ;;
  esac
done
"#
        )
    }

    const RESIGNS: &str = r#"
while read -r cmd rest; do
  case "$cmd" in
    quit) printf '= \n\n'; exit 0 ;;
    genmove) printf '= resign\n\n' ;;
    *) printf '= \n\n' ;;
  esac
done
"#;

    fn spec(white: Participant, black: Participant) -> GameSpec {
        let mut spec = GameSpec::new("game-1", white, black);
        spec.size = "5".into();
        spec.time_class = "fast".into();
        spec.setup = vec!["boardsize 5".into(), "time -g 10 -m 1".into()];
        spec
    }

    fn driver(spec: GameSpec) -> GameDriver {
        GameDriver::new(spec, SessionConfig::default())
    }

    #[tokio::test]
    async fn white_resigning_at_once_gives_black_the_game() {
        let spec = spec(engine(RESIGNS), engine(&counting(10, "white")));
        let outcome = driver(spec).run(CancellationToken::new()).await;

        assert_eq!(outcome.status, OutcomeStatus::Decided);
        let game = outcome.game().unwrap();
        assert_eq!(game.winner, Some(Winner::Black));
        assert_eq!(game.moves, 0);
        assert!(game.log.contains("# white resigns"));
    }

    #[tokio::test]
    async fn no_move_asks_the_white_session_for_the_winner() {
        let spec = spec(engine(&counting(2, "white")), engine(&counting(2, "black")));
        let outcome = driver(spec).run(CancellationToken::new()).await;

        assert!(outcome.is_decided(), "{outcome:?}");
        let game = outcome.game().unwrap();
        assert_eq!(game.winner, Some(Winner::White));
        assert_eq!(game.moves, 4);
        assert!(game.log.starts_with("boardsize 5\ntime -g 10 -m 1\nplay white a1\n"));
        assert!(game.log.contains("play black a2\n# took "));
        assert!(game.log.contains("# Winner: white\n# Total time: "));
    }

    #[tokio::test]
    async fn unrecognised_winner_is_an_error() {
        let spec = spec(engine(&counting(0, "maybe")), engine(&counting(0, "maybe")));
        let outcome = driver(spec).run(CancellationToken::new()).await;
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.game().unwrap().winner, None);
    }

    #[tokio::test]
    async fn engine_dying_mid_game_is_an_error() {
        let spec = spec(engine("read -r a; printf '= \\n\\n'; read -r b; printf '= \\n\\n'; exit 1"), engine(RESIGNS));
        let outcome = driver(spec).run(CancellationToken::new()).await;
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.reason.unwrap().contains("genmove"));
    }

    #[tokio::test]
    async fn rejected_setup_is_an_error() {
        let picky = r#"
while read -r cmd rest; do
  case "$cmd" in
    quit) printf '= \n\n'; exit 0 ;;
    boardsize) printf '? unacceptable size\n\n' ;;
    *) printf '= \n\n' ;;
  esac
done
"#;
        let spec = spec(engine(&counting(3, "white")), engine(picky));
        let outcome = driver(spec).run(CancellationToken::new()).await;
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.reason.unwrap().contains("unacceptable size"));
    }

    #[tokio::test]
    async fn move_limit_gives_no_result() {
        let mut spec = spec(engine(&counting(50, "white")), engine(&counting(50, "black")));
        spec.max_moves = Some(3);
        let outcome = driver(spec).run(CancellationToken::new()).await;
        assert_eq!(outcome.status, OutcomeStatus::NoResult);
        assert_eq!(outcome.game().unwrap().moves, 3);
    }

    #[tokio::test]
    async fn time_budget_exhaustion_gives_no_result() {
        let slow = r#"
n=0
while read -r cmd rest; do
  case "$cmd" in
    quit) printf '= \n\n'; exit 0 ;;
    genmove) sleep 0.1; n=$((n+1)); printf '= b%s\n\n' $n ;;
    *) printf '= \n\n' ;;
  esac
done
"#;
        let mut spec = spec(engine(slow), engine(slow));
        spec.time_budget = Some(std::time::Duration::from_millis(250));
        let outcome = driver(spec).run(CancellationToken::new()).await;

        assert_eq!(outcome.status, OutcomeStatus::NoResult);
        assert_eq!(outcome.reason.as_deref(), Some("time budget exhausted"));
        let moves = outcome.game().unwrap().moves;
        assert!(moves >= 1 && moves < 10, "moves {moves}");
    }

    #[tokio::test]
    async fn cancelled_game_gives_no_result() {
        let spec = spec(engine(&counting(50, "white")), engine(&counting(50, "black")));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = driver(spec).run(cancel).await;
        assert_eq!(outcome.status, OutcomeStatus::NoResult);
        assert_eq!(outcome.reason.as_deref(), Some("cancelled"));
    }

    #[tokio::test]
    async fn missing_engine_is_an_error() {
        let spec = spec(
            Participant::new("ghost", EngineCommand::new("/nonexistent/engine")),
            engine(RESIGNS),
        );
        let outcome = driver(spec).run(CancellationToken::new()).await;
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.reason.unwrap().starts_with("white:"));
    }
}
