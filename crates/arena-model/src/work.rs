use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{GameResult, ModelError};

/// An identifier together with the engine parameters it stands for.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub id: String,
    pub params: String,
}

/// One unit of remote work: play `player` against `baseline` at `size` under `time`.
///
/// Fetched fresh for every game and never reused.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub baseline: Param,
    pub player: Param,
    pub size: Param,
    pub time: Param,
}

impl WorkItem {
    /// Parse the collector's `key value` body.
    ///
    /// Keys: `b`/`bp` baseline, `p`/`pp` player, `s`/`sp` size, `t`/`tp` time.
    /// Ids are required, params default to empty. Unknown keys are ignored.
    pub fn parse(body: &str) -> Result<Self, ModelError> {
        let fields: HashMap<&str, &str> = body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| match l.split_once(' ') {
                Some((k, v)) => (k, v.trim()),
                None => (l, ""),
            })
            .collect();

        let param = |id: &'static str, params: &'static str| -> Result<Param, ModelError> {
            let id_val = fields
                .get(id)
                .filter(|v| !v.is_empty())
                .ok_or(ModelError::MissingField(id))?;
            Ok(Param {
                id: id_val.to_string(),
                params: fields.get(params).copied().unwrap_or_default().to_string(),
            })
        };

        Ok(Self {
            baseline: param("b", "bp")?,
            player: param("p", "pp")?,
            size: param("s", "sp")?,
            time: param("t", "tp")?,
        })
    }

    pub fn time_budget(&self) -> Result<TimeBudget, ModelError> {
        self.time.params.parse()
    }
}

/// Declared time control of a work item: seconds per game, seconds per move,
/// and an optional simulation count that is not a time and never scaled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeBudget {
    pub game: f64,
    pub per_move: f64,
    pub sims: Option<u64>,
}

impl TimeBudget {
    /// Multiply the time fields by a hardware calibration factor.
    pub fn scaled(&self, factor: f64) -> TimeBudget {
        let scale = |v: f64| (v * factor * 1000.0).round() / 1000.0;
        TimeBudget {
            game: scale(self.game),
            per_move: scale(self.per_move),
            sims: self.sims,
        }
    }

    /// Engine command that installs this time control.
    pub fn to_time_command(&self) -> String {
        let mut cmd = format!("time -g {} -m {}", self.game, self.per_move);
        if let Some(sims) = self.sims {
            cmd.push_str(&format!(" -s {sims}"));
        }
        cmd
    }
}

impl FromStr for TimeBudget {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidTimeBudget(s.to_string());
        let mut parts = s.split_whitespace();

        let mut seconds = || -> Result<f64, ModelError> {
            let v: f64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
            if v.is_finite() && v >= 0.0 { Ok(v) } else { Err(invalid()) }
        };
        let game = seconds()?;
        let per_move = seconds()?;

        let sims = match parts.next() {
            Some(v) => Some(v.parse().map_err(|_| invalid())?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self {
            game,
            per_move,
            sims,
        })
    }
}

impl fmt::Display for TimeBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.game, self.per_move)?;
        if let Some(sims) = self.sims {
            write!(f, " {sims}")?;
        }
        Ok(())
    }
}

/// Form body posted back to the collector after a game.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub baseline: String,
    pub player: String,
    pub size: String,
    pub time: String,
    /// 0 tie, 1 loss, 2 win for `player`.
    pub outcome: u8,
    pub log: String,
}

impl Submission {
    pub fn new(item: &WorkItem, result: GameResult, log: impl Into<String>) -> Self {
        Self {
            baseline: item.baseline.id.clone(),
            player: item.player.id.clone(),
            size: item.size.id.clone(),
            time: item.time.id.clone(),
            outcome: result.code(),
            log: log.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "b 3\nbp -r 0\np 12\npp -R 50 -p 1\ns 2\nsp 5\nt 1\ntp 5 3\n";

    #[test]
    fn parse_full_body() {
        let item = WorkItem::parse(BODY).unwrap();
        assert_eq!(item.baseline, Param { id: "3".into(), params: "-r 0".into() });
        assert_eq!(item.player.params, "-R 50 -p 1");
        assert_eq!(item.size.params, "5");
        assert_eq!(item.time.id, "1");
        assert_eq!(item.time.params, "5 3");
    }

    #[test]
    fn missing_params_default_to_empty() {
        let item = WorkItem::parse("b 1\nbp\np 2\ns 3\nt 4\n").unwrap();
        assert_eq!(item.baseline.params, "");
        assert_eq!(item.player.params, "");
    }

    #[test]
    fn missing_id_is_an_error() {
        assert_eq!(
            WorkItem::parse("b 1\np 2\ns 3\n"),
            Err(ModelError::MissingField("t"))
        );
    }

    #[test]
    fn time_budget_scales_times_only() {
        let tb: TimeBudget = "5 3".parse().unwrap();
        assert_eq!(tb.scaled(2.0).to_string(), "10 6");

        let tb: TimeBudget = "10 0.5 100".parse().unwrap();
        let scaled = tb.scaled(1.5);
        assert_eq!(scaled.to_string(), "15 0.75 100");
        assert_eq!(scaled.to_time_command(), "time -g 15 -m 0.75 -s 100");
    }

    #[test]
    fn time_budget_rejects_garbage() {
        assert!("5".parse::<TimeBudget>().is_err());
        assert!("five 3".parse::<TimeBudget>().is_err());
        assert!("5 -3".parse::<TimeBudget>().is_err());
        assert!("5 3 1 9".parse::<TimeBudget>().is_err());
    }

    #[test]
    fn submission_uses_ids_and_result_code() {
        let item = WorkItem::parse(BODY).unwrap();
        let sub = Submission::new(&item, GameResult::Win, "log");
        assert_eq!(sub.baseline, "3");
        assert_eq!(sub.player, "12");
        assert_eq!(sub.outcome, 2);
    }
}
