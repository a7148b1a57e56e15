use arena_model::{Outcome, OutcomeStatus, Payload};
use tracing::{error, info, warn};

#[inline]
pub fn message_for(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Decided => "task decided",
        OutcomeStatus::NoResult => "task ended without a result",
        OutcomeStatus::Error => "task failed",
    }
}

/// Log a finished task at a level matching its status.
pub fn log_outcome(outcome: &Outcome) {
    let msg = message_for(outcome.status);
    let elapsed_ms = outcome.elapsed.as_millis() as u64;
    let reason = outcome.reason.as_deref().unwrap_or("");

    match (&outcome.payload, outcome.status) {
        (Payload::Game(g), OutcomeStatus::Decided) => info!(
            target: "arena.outcome",
            task = %outcome.task,
            white = %g.white,
            black = %g.black,
            winner = g.winner.map(|w| w.as_str()).unwrap_or("none"),
            moves = g.moves,
            elapsed_ms,
            "{msg}"
        ),
        (Payload::Solve(s), OutcomeStatus::Decided) => info!(
            target: "arena.outcome",
            task = %outcome.task,
            result = s.result.as_str(),
            states = s.states,
            elapsed_ms,
            "{msg}"
        ),
        (_, OutcomeStatus::Decided) => info!(target: "arena.outcome", task = %outcome.task, elapsed_ms, "{msg}"),
        (_, OutcomeStatus::NoResult) => {
            warn!(target: "arena.outcome", task = %outcome.task, elapsed_ms, reason, "{msg}")
        }
        (_, OutcomeStatus::Error) => {
            error!(target: "arena.outcome", task = %outcome.task, elapsed_ms, reason, "{msg}")
        }
    }
}
