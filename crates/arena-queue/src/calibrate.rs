use std::{
    process::Stdio,
    time::{Duration, Instant},
};

use arena_model::{EngineCommand, TimeBudget};
use tokio::process::Command;
use tracing::{info, warn};

use crate::{BenchmarkConfig, QueueError};

/// Speed of this machine relative to the reference one.
///
/// A factor of 2.0 means the benchmark took twice as long here, so every
/// time budget is doubled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub measured: Duration,
    pub expected: Duration,
    pub factor: f64,
}

impl Calibration {
    /// Time one run of the benchmark.
    pub async fn measure(engine: &EngineCommand, bench: &BenchmarkConfig) -> Result<Self, QueueError> {
        info!(target: "arena.queue.calibrate", %engine, args = ?bench.args, "running benchmark");
        let started = Instant::now();
        let status = Command::new(&engine.program)
            .args(&engine.args)
            .args(&bench.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .await
            .map_err(|e| QueueError::Calibration(format!("spawn `{engine}`: {e}")))?;
        let measured = started.elapsed();
        if !status.success() {
            warn!(target: "arena.queue.calibrate", %status, "benchmark exited unsuccessfully");
        }
        Self::from_measurement(measured, bench)
    }

    pub fn from_measurement(measured: Duration, bench: &BenchmarkConfig) -> Result<Self, QueueError> {
        if measured < bench.min_runtime {
            return Err(QueueError::Calibration(format!(
                "benchmark took {:.3}s, less than the {:.3}s minimum",
                measured.as_secs_f64(),
                bench.min_runtime.as_secs_f64()
            )));
        }
        if bench.expected.is_zero() {
            return Err(QueueError::Calibration("expected benchmark time is zero".into()));
        }
        let factor = measured.as_secs_f64() / bench.expected.as_secs_f64();
        info!(
            target: "arena.queue.calibrate",
            measured_secs = measured.as_secs_f64(),
            factor,
            "calibrated"
        );
        Ok(Self {
            measured,
            expected: bench.expected,
            factor,
        })
    }

    /// Use a known factor instead of running the benchmark.
    pub fn fixed(factor: f64, bench: &BenchmarkConfig) -> Result<Self, QueueError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(QueueError::Calibration(format!("invalid factor {factor}")));
        }
        Ok(Self {
            measured: bench.expected.mul_f64(factor),
            expected: bench.expected,
            factor,
        })
    }

    pub fn scale(&self, budget: &TimeBudget) -> TimeBudget {
        budget.scaled(self.factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twice_as_slow_doubles_budgets() {
        let cal = Calibration::from_measurement(Duration::from_secs(22), &BenchmarkConfig::default()).unwrap();
        assert_eq!(cal.factor, 2.0);

        let budget: TimeBudget = "5 3".parse().unwrap();
        assert_eq!(cal.scale(&budget).to_string(), "10 6");
    }

    #[test]
    fn suspiciously_fast_benchmark_is_rejected() {
        let err = Calibration::from_measurement(Duration::from_millis(400), &BenchmarkConfig::default()).unwrap_err();
        assert!(matches!(err, QueueError::Calibration(_)));
    }

    #[test]
    fn fixed_factor() {
        let cal = Calibration::fixed(1.5, &BenchmarkConfig::default()).unwrap();
        assert_eq!(cal.measured, Duration::from_millis(16_500));
        assert!(Calibration::fixed(0.0, &BenchmarkConfig::default()).is_err());
        assert!(Calibration::fixed(f64::NAN, &BenchmarkConfig::default()).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn measure_times_the_engine() {
        let bench = BenchmarkConfig {
            args: vec!["bench".into()],
            expected: Duration::from_secs(1),
            min_runtime: Duration::from_millis(100),
        };
        let engine = EngineCommand::new("sh").with_args(["-c", "sleep 0.2"]);
        let cal = Calibration::measure(&engine, &bench).await.unwrap();
        assert!(cal.measured >= Duration::from_millis(200));
        assert!(cal.factor >= 0.2);
    }

    #[tokio::test]
    async fn missing_benchmark_binary() {
        let engine = EngineCommand::new("/nonexistent/castro");
        let err = Calibration::measure(&engine, &BenchmarkConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("spawn"));
    }
}
