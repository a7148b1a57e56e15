//! Task drivers: one game or one solve, from opening the engines to closing them.
//!
//! Every driver walks the same states and always reaches
//! [`DriverState::Cleanup`]; protocol problems become outcome values, never
//! early returns past the cleanup step.

use std::fmt;

use tracing::debug;

mod game;
pub use game::GameDriver;

mod solve;
pub use solve::SolveDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Init,
    Setup,
    Exchange,
    Terminal,
    Cleanup,
}

impl DriverState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverState::Init => "init",
            DriverState::Setup => "setup",
            DriverState::Exchange => "exchange",
            DriverState::Terminal => "terminal",
            DriverState::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and traces the state of one driver run.
pub(crate) struct Progress<'a> {
    task: &'a str,
    state: DriverState,
}

impl<'a> Progress<'a> {
    pub(crate) fn start(task: &'a str) -> Self {
        debug!(target: "arena.exec.driver", task, state = %DriverState::Init, "driver started");
        Self {
            task,
            state: DriverState::Init,
        }
    }

    pub(crate) fn enter(&mut self, next: DriverState) {
        debug!(
            target: "arena.exec.driver",
            task = self.task,
            from = %self.state,
            to = %next,
            "state transition"
        );
        self.state = next;
    }

    pub(crate) fn state(&self) -> DriverState {
        self.state
    }
}

/// How a run ended, before it is turned into an outcome.
#[derive(Debug)]
pub(crate) enum Verdict<T> {
    Decided(T),
    NoResult(String),
    Error(String),
}
