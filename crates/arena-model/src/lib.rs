//! Plain data shared by every arena crate.
//!
//! Nothing here talks to processes or the network: task descriptors go in,
//! [`Outcome`]s come out, and the remote work-queue records are parsed and
//! rendered here so that both the worker and its tests agree on the format.

mod error;
pub use error::ModelError;

mod outcome;
pub use outcome::{
    GameRecord, GameResult, Outcome, OutcomeStatus, Payload, Side, SolveRecord, SolveResult,
    Winner,
};

mod task;
pub use task::{EngineCommand, GameSpec, Participant, SolveSpec};

mod work;
pub use work::{Param, Submission, TimeBudget, WorkItem};
