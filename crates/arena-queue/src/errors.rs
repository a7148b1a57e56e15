use arena_model::{ModelError, OutcomeStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("collector answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("bad work item: {0}")]
    InvalidWork(#[from] ModelError),

    #[error("no work available")]
    NoWork,

    #[error("calibration failed: {0}")]
    Calibration(String),

    #[error("game {task} ended {status}: {reason}")]
    Undecided {
        task: String,
        status: OutcomeStatus,
        reason: String,
    },
}
