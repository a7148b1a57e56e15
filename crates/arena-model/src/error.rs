use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("empty engine command line")]
    EmptyCommand,
    #[error("work item is missing field {0:?}")]
    MissingField(&'static str),
    #[error("invalid time budget {0:?}")]
    InvalidTimeBudget(String),
    #[error("unrecognized solve result {0:?}")]
    UnknownSolveResult(String),
    #[error("unrecognized winner {0:?}")]
    UnknownWinner(String),
}
