use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunnerError {
    #[error("a tournament needs at least two players, got {0}")]
    NotEnoughPlayers(usize),
    #[error("no test cases to run")]
    NoTests,
    #[error("solver name is empty")]
    MissingSolver,
}
