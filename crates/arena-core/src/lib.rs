//! Bounded-concurrency execution for independent, long-running tasks.
//!
//! Two scheduling strategies are offered:
//! - [`Engine::map`]: spawn-per-item with a concurrency ceiling, results in input order,
//!   crash-isolated per item. Meant for heterogeneous batches where every item owns
//!   heavyweight subprocesses.
//! - [`pool::each`] / [`pool::map`]: a fixed set of scoped threads pulling indices
//!   from a shared cursor. Meant for cheap, homogeneous, in-process work.
//!
//! [`Engine::run_loop`] keeps a fixed number of slots busy forever, for services.

mod config;
pub use config::EngineConfig;

mod error;
pub use error::{CoreError, SlotError};

mod engine;
pub use engine::Engine;

pub mod pool;

mod slots;
pub use slots::ResultSlots;

pub mod wire;

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
