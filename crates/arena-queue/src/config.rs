use std::time::Duration;

use arena_exec::SessionConfig;
use arena_model::EngineCommand;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker identity used in task ids and logs.
    pub name: String,
    /// Collector base URL, without the `/api/...` suffix.
    pub endpoint: String,
    /// Engine used for both seats of every game.
    pub engine: EngineCommand,
    /// Pause after a failed round.
    pub retry_delay: Duration,
    /// Timeout for one collector request.
    pub request_timeout: Duration,
    /// Wall-clock cap per game; `None` trusts the engines' own time control.
    pub game_budget: Option<Duration>,
    pub session: SessionConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "arena-worker".into(),
            endpoint: "http://havannah.ewalds.ca".into(),
            engine: EngineCommand::new("./castro"),
            retry_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            game_budget: None,
            session: SessionConfig::default(),
        }
    }
}

/// Reference task timed once at startup to derive the calibration factor.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Appended to the engine command.
    pub args: Vec<String>,
    /// Runtime of the benchmark on the reference machine.
    pub expected: Duration,
    /// Runs faster than this are taken as a broken benchmark.
    pub min_runtime: Duration,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            args: vec!["-f".into(), "test/speed4.tst".into()],
            expected: Duration::from_secs(11),
            min_runtime: Duration::from_secs(1),
        }
    }
}
