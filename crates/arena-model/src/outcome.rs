use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Final classification of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeStatus {
    /// The task reached an authoritative result (a winner, a proof).
    Decided,
    /// The task ran out of budget or was stopped before a result existed.
    NoResult,
    /// Protocol or process failure; the payload may be partial.
    Error,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Decided => "decided",
            OutcomeStatus::NoResult => "no-result",
            OutcomeStatus::Error => "error",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour of a seat in a two-player game. White moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who won a finished game, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl Winner {
    pub fn side(side: Side) -> Winner {
        match side {
            Side::White => Winner::White,
            Side::Black => Winner::Black,
        }
    }

    /// Result of the game seen from `side`.
    pub fn result_for(self, side: Side) -> GameResult {
        match (self, side) {
            (Winner::Draw, _) => GameResult::Tie,
            (Winner::White, Side::White) | (Winner::Black, Side::Black) => GameResult::Win,
            _ => GameResult::Loss,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::White => "white",
            Winner::Black => "black",
            Winner::Draw => "draw",
        }
    }
}

impl FromStr for Winner {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "white" => Ok(Winner::White),
            "black" => Ok(Winner::Black),
            "draw" => Ok(Winner::Draw),
            other => Err(ModelError::UnknownWinner(other.to_string())),
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game result from one participant's point of view.
///
/// The numeric codes are the ones the collector expects in `outcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameResult {
    Tie,
    Loss,
    Win,
}

impl GameResult {
    pub fn code(&self) -> u8 {
        match self {
            GameResult::Tie => 0,
            GameResult::Loss => 1,
            GameResult::Win => 2,
        }
    }

    pub fn flipped(self) -> GameResult {
        match self {
            GameResult::Tie => GameResult::Tie,
            GameResult::Loss => GameResult::Win,
            GameResult::Win => GameResult::Loss,
        }
    }
}

/// Value a solver reports for the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveResult {
    BlackOrDraw,
    WhiteOrDraw,
    Draw,
    White,
    Black,
    Unknown,
}

impl SolveResult {
    pub fn is_known(&self) -> bool {
        !matches!(self, SolveResult::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolveResult::BlackOrDraw => "black_or_draw",
            SolveResult::WhiteOrDraw => "white_or_draw",
            SolveResult::Draw => "draw",
            SolveResult::White => "white",
            SolveResult::Black => "black",
            SolveResult::Unknown => "unknown",
        }
    }
}

impl FromStr for SolveResult {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "black_or_draw" => Ok(SolveResult::BlackOrDraw),
            "white_or_draw" => Ok(SolveResult::WhiteOrDraw),
            "draw" => Ok(SolveResult::Draw),
            "white" => Ok(SolveResult::White),
            "black" => Ok(SolveResult::Black),
            "unknown" => Ok(SolveResult::Unknown),
            other => Err(ModelError::UnknownSolveResult(other.to_string())),
        }
    }
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a two-player game produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Participant name seated as white.
    pub white: String,
    /// Participant name seated as black.
    pub black: String,
    pub size: String,
    pub time_class: String,
    /// `None` unless the outcome is decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    /// Moves relayed between the two sessions.
    pub moves: u32,
    /// Replayable protocol log of the game.
    #[serde(default)]
    pub log: String,
}

impl GameRecord {
    /// Name of the participant that played `side`.
    pub fn name_of(&self, side: Side) -> &str {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}

/// What a solve produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRecord {
    pub size: String,
    pub result: SolveResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_move: Option<String>,
    pub depth: u64,
    /// Nodes the solver reports having seen, summed over all polls.
    pub states: u64,
    pub polls: u32,
}

/// Task-specific part of an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Payload {
    #[default]
    None,
    Game(GameRecord),
    Solve(SolveRecord),
}

/// Structured result of one completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Identity of the task that produced this outcome.
    pub task: String,
    pub elapsed: Duration,
    pub status: OutcomeStatus,
    #[serde(default)]
    pub payload: Payload,
    /// Why the task is not decided; `None` for decided outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Outcome {
    pub fn decided(task: impl Into<String>, elapsed: Duration, payload: Payload) -> Self {
        Self {
            task: task.into(),
            elapsed,
            status: OutcomeStatus::Decided,
            payload,
            reason: None,
        }
    }

    pub fn no_result(
        task: impl Into<String>,
        elapsed: Duration,
        payload: Payload,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            elapsed,
            status: OutcomeStatus::NoResult,
            payload,
            reason: Some(reason.into()),
        }
    }

    pub fn error(
        task: impl Into<String>,
        elapsed: Duration,
        payload: Payload,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            elapsed,
            status: OutcomeStatus::Error,
            payload,
            reason: Some(reason.into()),
        }
    }

    pub fn is_decided(&self) -> bool {
        self.status == OutcomeStatus::Decided
    }

    pub fn game(&self) -> Option<&GameRecord> {
        match &self.payload {
            Payload::Game(g) => Some(g),
            _ => None,
        }
    }

    pub fn solve(&self) -> Option<&SolveRecord> {
        match &self.payload {
            Payload::Solve(s) => Some(s),
            _ => None,
        }
    }
}
