use std::time::Duration;

use anyhow::{Context, bail};
use arena_model::EngineCommand;

pub const ENV_URL: &str = "ARENA_URL";
pub const ENV_PARALLEL: &str = "ARENA_PARALLEL";
pub const ENV_ENGINE: &str = "ARENA_ENGINE";
pub const ENV_BENCH: &str = "ARENA_BENCH";
pub const ENV_TIME_LIMIT: &str = "ARENA_TIME_LIMIT";

/// Agent settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentEnv {
    pub url: Option<String>,
    pub parallel: usize,
    pub engine: Option<EngineCommand>,
    /// Known calibration factor; skips the benchmark.
    pub factor: Option<f64>,
    /// Stop taking new games after this long.
    pub time_limit: Option<Duration>,
}

impl AgentEnv {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let parallel = match get(ENV_PARALLEL) {
            Some(v) => v.parse().with_context(|| format!("{ENV_PARALLEL}={v}"))?,
            None => 1,
        };
        if parallel == 0 {
            bail!("{ENV_PARALLEL} must be at least 1");
        }

        let engine = get(ENV_ENGINE)
            .map(|v| EngineCommand::parse(&v).with_context(|| format!("{ENV_ENGINE}={v}")))
            .transpose()?;

        let factor = match get(ENV_BENCH) {
            Some(v) => Some(v.parse::<f64>().with_context(|| format!("{ENV_BENCH}={v}"))?),
            None => None,
        };

        let time_limit = match get(ENV_TIME_LIMIT) {
            Some(v) => {
                let secs: f64 = v.parse().with_context(|| format!("{ENV_TIME_LIMIT}={v}"))?;
                if !secs.is_finite() || secs <= 0.0 {
                    bail!("{ENV_TIME_LIMIT} must be a positive number of seconds");
                }
                Some(Duration::from_secs_f64(secs))
            }
            None => None,
        };

        Ok(Self {
            url: get(ENV_URL),
            parallel,
            engine,
            factor,
            time_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> anyhow::Result<AgentEnv> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AgentEnv::from_lookup(move |k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let e = env(&[]).unwrap();
        assert_eq!(e.parallel, 1);
        assert_eq!(e.url, None);
        assert_eq!(e.engine, None);
        assert_eq!(e.time_limit, None);
    }

    #[test]
    fn reads_every_variable() {
        let e = env(&[
            (ENV_URL, "http://collector:8080"),
            (ENV_PARALLEL, "4"),
            (ENV_ENGINE, "./castro -v"),
            (ENV_BENCH, "1.25"),
            (ENV_TIME_LIMIT, "3600"),
        ])
        .unwrap();
        assert_eq!(e.url.as_deref(), Some("http://collector:8080"));
        assert_eq!(e.parallel, 4);
        assert_eq!(e.engine.unwrap().args, vec!["-v"]);
        assert_eq!(e.factor, Some(1.25));
        assert_eq!(e.time_limit, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(env(&[(ENV_PARALLEL, "many")]).is_err());
        assert!(env(&[(ENV_PARALLEL, "0")]).is_err());
        assert!(env(&[(ENV_TIME_LIMIT, "-5")]).is_err());
        assert!(env(&[(ENV_BENCH, "fast")]).is_err());
    }
}
