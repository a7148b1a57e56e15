use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Program plus arguments used to start an engine process.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineCommand {
    /// Executable path (e.g. `"./castro"`).
    pub program: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Split a command line on whitespace. No shell quoting is interpreted.
    pub fn parse(line: &str) -> Result<Self, ModelError> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(ModelError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// One seat in a game: a display name and how to start its engine.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub command: EngineCommand,
}

impl Participant {
    pub fn new(name: impl Into<String>, command: EngineCommand) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }
}

/// Descriptor of a two-player game between two engine processes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSpec {
    pub id: String,
    pub white: Participant,
    pub black: Participant,
    /// Commands sent to both sessions, in order, before the first move.
    #[serde(default)]
    pub setup: Vec<String>,
    /// Commands sent only to white after the shared setup.
    #[serde(default)]
    pub white_setup: Vec<String>,
    /// Commands sent only to black after the shared setup.
    #[serde(default)]
    pub black_setup: Vec<String>,
    /// Aggregation label for the board size.
    pub size: String,
    /// Aggregation label for the time control.
    pub time_class: String,
    /// Wall-clock budget for the whole game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_moves: Option<u32>,
}

impl GameSpec {
    pub fn new(id: impl Into<String>, white: Participant, black: Participant) -> Self {
        Self {
            id: id.into(),
            white,
            black,
            setup: Vec::new(),
            white_setup: Vec::new(),
            black_setup: Vec::new(),
            size: String::new(),
            time_class: String::new(),
            time_budget: None,
            max_moves: None,
        }
    }
}

/// Descriptor of a single-engine solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveSpec {
    pub id: String,
    pub command: EngineCommand,
    /// Commands sent before the solver is configured (boardsize, playgame, ...).
    #[serde(default)]
    pub setup: Vec<String>,
    /// Solver name, used as the command prefix: `<solver>_params`, `<solver>_solve`.
    pub solver: String,
    #[serde(default)]
    pub params: String,
    /// Memory limit handed to the solver in MB; `0` leaves it unset.
    #[serde(default)]
    pub memory_mb: u64,
    pub size: String,
    /// Total time the solve may take.
    pub budget: Duration,
    /// Time per status poll; `None` means one poll with the whole budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<Duration>,
}

impl SolveSpec {
    pub fn new(
        id: impl Into<String>,
        command: EngineCommand,
        solver: impl Into<String>,
        budget: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            command,
            setup: Vec::new(),
            solver: solver.into(),
            params: String::new(),
            memory_mb: 0,
            size: String::new(),
            budget,
            slice: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_whitespace() {
        let cmd = EngineCommand::parse("  ./castro   -f test/speed4.tst ").unwrap();
        assert_eq!(cmd.program, "./castro");
        assert_eq!(cmd.args, vec!["-f", "test/speed4.tst"]);
        assert_eq!(cmd.to_string(), "./castro -f test/speed4.tst");
    }

    #[test]
    fn parse_rejects_blank_line() {
        assert_eq!(EngineCommand::parse("   "), Err(ModelError::EmptyCommand));
    }

    #[test]
    fn with_args_appends() {
        let cmd = EngineCommand::new("sh").with_args(["-c", "exit 0"]);
        assert_eq!(cmd.args, vec!["-c", "exit 0"]);
    }

    #[test]
    fn game_spec_json_omits_unset_limits() {
        let spec = GameSpec::new(
            "game-1",
            Participant::new("a", EngineCommand::new("./a")),
            Participant::new("b", EngineCommand::new("./b")),
        );
        let json = serde_json::to_string(&spec).unwrap();
        assert!(!json.contains("timeBudget"));
        assert!(!json.contains("maxMoves"));

        let back: GameSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
