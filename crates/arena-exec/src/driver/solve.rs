use std::time::{Duration, Instant};

use arena_model::{Outcome, Payload, SolveRecord, SolveResult, SolveSpec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{DriverState, Progress, Verdict};
use crate::{Session, SessionConfig};

/// Runs one solver session until it proves a result or its budget runs out.
#[derive(Debug, Clone)]
pub struct SolveDriver {
    spec: SolveSpec,
    cfg: SessionConfig,
}

/// One parsed `<solver>_solve` reply.
#[derive(Debug, PartialEq, Eq)]
struct Poll {
    result: SolveResult,
    best_move: Option<String>,
    depth: u64,
    nodes: u64,
}

impl Poll {
    fn parse(payload: &str, no_move: &str) -> Result<Self, String> {
        let fields: Vec<&str> = payload.split_whitespace().collect();
        let [result, mv, depth, nodes] = fields[..] else {
            return Err(format!("expected `result move depth nodes`, got `{payload}`"));
        };
        let number = |what: &str, v: &str| v.parse::<u64>().map_err(|_| format!("bad {what} `{v}` in `{payload}`"));
        Ok(Self {
            result: result.parse().map_err(|e: arena_model::ModelError| e.to_string())?,
            best_move: (!mv.eq_ignore_ascii_case(no_move)).then(|| mv.to_string()),
            depth: number("depth", depth)?,
            nodes: number("node count", nodes)?,
        })
    }
}

impl SolveDriver {
    pub fn new(spec: SolveSpec, cfg: SessionConfig) -> Self {
        Self { spec, cfg }
    }

    pub fn spec(&self) -> &SolveSpec {
        &self.spec
    }

    /// `<solver>_params <params> -m <mb>`, without the parts that are unset.
    pub fn params_command(&self) -> String {
        let mut cmd = format!("{}_params", self.spec.solver);
        if !self.spec.params.trim().is_empty() {
            cmd.push(' ');
            cmd.push_str(self.spec.params.trim());
        }
        if self.spec.memory_mb > 0 {
            cmd.push_str(&format!(" -m {}", self.spec.memory_mb));
        }
        cmd
    }

    pub async fn run(&self, cancel: CancellationToken) -> Outcome {
        let started = Instant::now();
        let spec = &self.spec;
        let mut progress = Progress::start(&spec.id);
        let mut record = SolveRecord {
            size: spec.size.clone(),
            result: SolveResult::Unknown,
            best_move: None,
            depth: 0,
            states: 0,
            polls: 0,
        };

        let mut session = match Session::open(spec.id.clone(), &spec.command, &self.cfg) {
            Ok(s) => s,
            Err(e) => return Outcome::error(&spec.id, started.elapsed(), Payload::Solve(record), e.to_string()),
        };

        let verdict = self.solve(&mut session, &mut record, &mut progress, &cancel).await;

        progress.enter(DriverState::Cleanup);
        if let Err(e) = session.close().await {
            warn!(target: "arena.exec.driver", task = %spec.id, error = %e, "close failed");
        }

        let elapsed = started.elapsed();
        match verdict {
            Verdict::Decided(()) => {
                info!(
                    target: "arena.exec.driver",
                    task = %spec.id,
                    result = %record.result,
                    states = record.states,
                    "solved"
                );
                Outcome::decided(&spec.id, elapsed, Payload::Solve(record))
            }
            Verdict::NoResult(reason) => Outcome::no_result(&spec.id, elapsed, Payload::Solve(record), reason),
            Verdict::Error(reason) => {
                warn!(target: "arena.exec.driver", task = %spec.id, state = %progress.state(), %reason, "solve failed");
                Outcome::error(&spec.id, elapsed, Payload::Solve(record), reason)
            }
        }
    }

    async fn solve(
        &self,
        session: &mut Session,
        record: &mut SolveRecord,
        progress: &mut Progress<'_>,
        cancel: &CancellationToken,
    ) -> Verdict<()> {
        let spec = &self.spec;

        progress.enter(DriverState::Setup);
        let params = self.params_command();
        for cmd in spec.setup.iter().chain(std::iter::once(&params)) {
            let reply = session.send(cmd).await;
            if !reply.is_success() {
                return Verdict::Error(format!("`{cmd}` rejected: {}", reply.payload));
            }
        }

        progress.enter(DriverState::Exchange);
        let slice = spec.slice.filter(|s| !s.is_zero()).unwrap_or(spec.budget);
        let mut spent = Duration::ZERO;
        loop {
            if cancel.is_cancelled() {
                return Verdict::NoResult("cancelled".into());
            }
            let step = slice.min(spec.budget.saturating_sub(spent));
            let cmd = format!("{}_solve {}", spec.solver, step.as_secs_f64());
            let reply = session.send(&cmd).await;
            if !reply.is_success() {
                return Verdict::Error(format!("`{cmd}` failed: {}", reply.payload));
            }

            let poll = match Poll::parse(&reply.payload, &self.cfg.dialect.no_move) {
                Ok(p) => p,
                Err(reason) => return Verdict::Error(reason),
            };
            record.polls += 1;
            record.states += poll.nodes;
            record.result = poll.result;
            record.best_move = poll.best_move;
            record.depth = poll.depth;
            spent += step;
            debug!(target: "arena.exec.driver", task = %spec.id, poll = record.polls, result = %record.result, "solver polled");

            if record.result.is_known() {
                break;
            }
            if spent >= spec.budget {
                return Verdict::NoResult("budget exhausted".into());
            }
        }

        progress.enter(DriverState::Terminal);
        Verdict::Decided(())
    }
}

#[cfg(test)]
mod tests {
    use arena_model::{EngineCommand, OutcomeStatus};

    use super::*;

    #[test]
    fn poll_reply_fields() {
        let p = Poll::parse("white_or_draw c3 12 4500", "none").unwrap();
        assert_eq!(p.result, SolveResult::WhiteOrDraw);
        assert_eq!(p.best_move.as_deref(), Some("c3"));
        assert_eq!(p.depth, 12);
        assert_eq!(p.nodes, 4500);

        let p = Poll::parse("unknown none 0 10", "none").unwrap();
        assert_eq!(p.best_move, None);

        assert!(Poll::parse("unknown none 0", "none").is_err());
        assert!(Poll::parse("proven a1 1 1", "none").is_err());
        assert!(Poll::parse("draw a1 x 1", "none").is_err());
    }

    #[test]
    fn params_command_skips_unset_parts() {
        let mut spec = SolveSpec::new("t", EngineCommand::new("./castro"), "pns", Duration::from_secs(10));
        let d = SolveDriver::new(spec.clone(), SessionConfig::default());
        assert_eq!(d.params_command(), "pns_params");

        spec.params = "-e 0 -a 1 -d 1".into();
        spec.memory_mb = 100;
        let d = SolveDriver::new(spec, SessionConfig::default());
        assert_eq!(d.params_command(), "pns_params -e 0 -a 1 -d 1 -m 100");
    }

    #[cfg(unix)]
    mod engine {
        use super::*;

        /// Answers `unknown` until the `$1`-th solve poll, then `black`.
        fn solver(proves_at: u32) -> EngineCommand {
            let body = format!(
                r#"
n=0
while read -r cmd rest; do
  case "$cmd" in
    quit) printf '= \n\n'; exit 0 ;;
    pns_params) printf '= \n\n' ;;
    pns_solve) n=$((n+1)); if [ $n -ge {proves_at} ]; then printf '= black b2 7 300\n\n'; else printf '= unknown none 3 100\n\n'; fi ;;
    *) printf '? unknown command\n\n' ;;
  esac
done
"#
            );
            EngineCommand::new("sh").with_args(["-c", body.as_str()])
        }

        fn spec(cmd: EngineCommand, slice: Option<Duration>) -> SolveSpec {
            let mut spec = SolveSpec::new("solver/4/1.tst", cmd, "pns", Duration::from_secs(10));
            spec.size = "4".into();
            spec.memory_mb = 100;
            spec.slice = slice;
            spec
        }

        async fn run(spec: SolveSpec) -> Outcome {
            SolveDriver::new(spec, SessionConfig::default())
                .run(CancellationToken::new())
                .await
        }

        #[tokio::test]
        async fn single_poll_without_slice() {
            let outcome = run(spec(solver(1), None)).await;
            assert!(outcome.is_decided());
            let solve = outcome.solve().unwrap();
            assert_eq!(solve.result, SolveResult::Black);
            assert_eq!(solve.best_move.as_deref(), Some("b2"));
            assert_eq!(solve.polls, 1);
            assert_eq!(solve.states, 300);
        }

        #[tokio::test]
        async fn unknown_after_whole_budget_is_no_result() {
            let outcome = run(spec(solver(99), None)).await;
            assert_eq!(outcome.status, OutcomeStatus::NoResult);
            assert_eq!(outcome.solve().unwrap().polls, 1);
            assert_eq!(outcome.reason.as_deref(), Some("budget exhausted"));
        }

        #[tokio::test]
        async fn sliced_polls_sum_states() {
            let outcome = run(spec(solver(3), Some(Duration::from_secs(2)))).await;
            assert!(outcome.is_decided());
            let solve = outcome.solve().unwrap();
            assert_eq!(solve.polls, 3);
            assert_eq!(solve.states, 100 + 100 + 300);
            assert_eq!(solve.depth, 7);
        }

        #[tokio::test]
        async fn sliced_budget_runs_out() {
            let outcome = run(spec(solver(99), Some(Duration::from_secs(3)))).await;
            assert_eq!(outcome.status, OutcomeStatus::NoResult);
            // 3 + 3 + 3 + 1 seconds.
            assert_eq!(outcome.solve().unwrap().polls, 4);
        }

        #[tokio::test]
        async fn garbage_reply_is_an_error() {
            let cmd = EngineCommand::new("sh").with_args([
                "-c",
                "while read -r c r; do case $c in quit) exit 0;; pns_solve) printf '= ???\\n\\n';; *) printf '= \\n\\n';; esac; done",
            ]);
            let outcome = run(spec(cmd, None)).await;
            assert_eq!(outcome.status, OutcomeStatus::Error);
        }
    }
}
