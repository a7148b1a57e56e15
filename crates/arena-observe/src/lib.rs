mod logger;
pub use logger::*;

mod outcome;
pub use outcome::{log_outcome, message_for};
