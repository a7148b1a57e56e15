//! Folding outcomes into tables.
//!
//! Everything here runs on one thread after the engine has returned; nothing
//! is shared or locked.

mod aggregate;
pub use aggregate::{Aggregate, AggregateCell, CellKey};

mod matrix;
pub use matrix::WinMatrix;

mod summary;
pub use summary::SolveSummary;
