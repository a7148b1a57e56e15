//! Batch callers of the engine: round-robin tournaments and solver test suites.

mod error;
pub use error::RunnerError;

mod schedule;
pub use schedule::{Pairing, Schedule};

mod tournament;
pub use tournament::{Tournament, TournamentConfig, TournamentReport};

mod suite;
pub use suite::{Suite, SuiteConfig, SuiteReport};
