use std::{
    collections::BTreeMap,
    fmt::Write as _,
    time::{Duration, Instant},
};

use arena_core::Engine;
use arena_exec::{SessionConfig, SolveDriver};
use arena_model::{EngineCommand, Outcome, Payload, SolveSpec};
use arena_report::{Aggregate, SolveSummary};
use tracing::{info, warn};

use crate::RunnerError;

/// A solver run over `<dir>/<size>/<n>.tst` for every size and `n` in `1..=per_size`.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub exec: EngineCommand,
    pub dir: String,
    pub sizes: Vec<u32>,
    pub per_size: u32,
    pub solver: String,
    pub params: String,
    pub memory_mb: u64,
    /// Time limit per solve.
    pub time: Duration,
    /// Poll interval; `None` solves in one request.
    pub slice: Option<Duration>,
    pub session: SessionConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            exec: EngineCommand::new("./castro"),
            dir: "solver".into(),
            sizes: vec![4],
            per_size: 10,
            solver: "pns".into(),
            params: "-e 0 -a 1 -d 1".into(),
            memory_mb: 100,
            time: Duration::from_secs(10),
            slice: None,
            session: SessionConfig::default(),
        }
    }
}

impl SuiteConfig {
    /// `(size, path)` of every test case, sizes in the configured order.
    pub fn tests(&self) -> Vec<(String, String)> {
        self.sizes
            .iter()
            .flat_map(|size| (1..=self.per_size).map(move |n| (size.to_string(), format!("{}/{size}/{n}.tst", self.dir))))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SuiteReport {
    /// One outcome per test, in test order; `task` is the test path.
    pub outcomes: Vec<Outcome>,
    pub aggregate: Aggregate,
    pub elapsed: Duration,
}

impl SuiteReport {
    pub fn total(&self) -> SolveSummary {
        let mut total = SolveSummary::default();
        for (_, summary) in self.aggregate.solves() {
            total.merge(summary);
        }
        total
    }

    /// One line per test followed by the solved/total table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for o in &self.outcomes {
            let _ = write!(out, "{} {:.3}", o.task, o.elapsed.as_secs_f64());
            match o.solve() {
                Some(s) => {
                    let mv = s.best_move.as_deref().unwrap_or("none");
                    let _ = writeln!(out, " {} {mv} {} {}", s.result, s.depth, s.states);
                }
                None => {
                    let _ = writeln!(out, " {}", o.status);
                }
            }
        }

        let per_size: BTreeMap<&str, &SolveSummary> = self.aggregate.solves().collect();
        if per_size.len() > 1 {
            for (size, summary) in per_size {
                let _ = writeln!(out, "size {size}");
                out.push_str(&summary.render());
            }
        }
        out.push_str(&self.total().render());
        out
    }
}

/// Runs one [`SolveDriver`] per test case through the engine.
pub struct Suite {
    cfg: SuiteConfig,
}

impl Suite {
    pub fn new(cfg: SuiteConfig) -> Self {
        Self { cfg }
    }

    fn solve_spec(&self, size: String, path: String) -> SolveSpec {
        let cfg = &self.cfg;
        let command = cfg.exec.clone().with_args(["-f", path.as_str()]);
        let mut spec = SolveSpec::new(path, command, cfg.solver.clone(), cfg.time);
        spec.params = cfg.params.clone();
        spec.memory_mb = cfg.memory_mb;
        spec.size = size;
        spec.slice = cfg.slice;
        spec
    }

    pub async fn run(&self, engine: &Engine) -> Result<SuiteReport, RunnerError> {
        if self.cfg.solver.trim().is_empty() {
            return Err(RunnerError::MissingSolver);
        }
        let tests = self.cfg.tests();
        if tests.is_empty() {
            return Err(RunnerError::NoTests);
        }

        let started = Instant::now();
        info!(target: "arena.runner.suite", tests = tests.len(), solver = %self.cfg.solver, "suite started");

        let specs: Vec<SolveSpec> = tests.into_iter().map(|(size, path)| self.solve_spec(size, path)).collect();
        let ids: Vec<String> = specs.iter().map(|s| s.id.clone()).collect();
        let session = self.cfg.session.clone();
        let results = engine
            .map(specs, |spec, token| {
                let driver = SolveDriver::new(spec, session.clone());
                async move { driver.run(token).await }
            })
            .await;

        let outcomes: Vec<Outcome> = results
            .into_iter()
            .zip(ids)
            .map(|(result, id)| {
                result.unwrap_or_else(|e| {
                    warn!(target: "arena.runner.suite", task = %id, error = %e, "test produced no outcome");
                    Outcome::error(id, Duration::ZERO, Payload::None, e.to_string())
                })
            })
            .collect();

        let aggregate = Aggregate::fold(&outcomes);
        let elapsed = started.elapsed();
        info!(target: "arena.runner.suite", elapsed_secs = elapsed.as_secs(), "suite finished");
        Ok(SuiteReport {
            outcomes,
            aggregate,
            elapsed,
        })
    }
}
