//! Engine subprocesses: the line protocol spoken over their pipes and the
//! drivers that run one game or one solve to an [`Outcome`](arena_model::Outcome).

mod error;
pub use error::ExecError;

mod limits;
pub use limits::{ProcessLimits, attach_limits};

mod util;
pub use util::kill_graceful;

pub mod proto;
pub use proto::{Dialect, Response, ResponseKind, Session, SessionConfig};

pub mod driver;
pub use driver::{DriverState, GameDriver, SolveDriver};
