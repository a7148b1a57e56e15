mod env;

use anyhow::Context;
use arena_core::{Engine, EngineConfig};
use arena_observe::{LoggerConfig, logger_init};
use arena_queue::{BenchmarkConfig, Calibration, HttpCollector, Worker, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::env::AgentEnv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_cfg = LoggerConfig::from_env()?;
    logger_init(&log_cfg)?;

    let env = AgentEnv::from_env()?;
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "arena-worker".to_string());

    let mut cfg = WorkerConfig {
        name: host,
        ..WorkerConfig::default()
    };
    if let Some(url) = env.url {
        cfg.endpoint = url;
    }
    if let Some(engine) = env.engine {
        cfg.engine = engine;
    }
    info!(
        name = %cfg.name,
        endpoint = %cfg.endpoint,
        engine = %cfg.engine,
        parallel = env.parallel,
        "agent starting"
    );

    let bench = BenchmarkConfig::default();
    let calibration = match env.factor {
        Some(factor) => Calibration::fixed(factor, &bench)?,
        None => Calibration::measure(&cfg.engine, &bench)
            .await
            .context("hardware calibration")?,
    };
    info!(factor = calibration.factor, "time budgets scaled");

    let collector = HttpCollector::new(cfg.endpoint.clone(), cfg.request_timeout)?;
    let engine = Engine::new(EngineConfig::with_limit(env.parallel), CancellationToken::new());

    {
        let engine = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for interrupts");
                return;
            }
            info!("interrupt received; finishing running games");
            engine.cancel();
        });
    }
    if let Some(limit) = env.time_limit {
        let engine = engine.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            info!(?limit, "time limit reached; finishing running games");
            engine.cancel();
        });
    }

    Worker::new(collector, cfg, calibration).run(&engine).await;
    info!("agent stopped");
    Ok(())
}
