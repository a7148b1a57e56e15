//! Line protocol spoken with engine subprocesses.
//!
//! A command is one line; the reply is `=` (success) or `?` (failure),
//! an optional numeric id, the payload, and a blank line.

mod dialect;
pub use dialect::Dialect;

mod response;
pub use response::{Response, ResponseKind};

mod session;
pub use session::{Session, SessionConfig};
