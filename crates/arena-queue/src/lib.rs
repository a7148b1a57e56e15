//! Distributed worker: pulls work items from a collector, plays them, and
//! reports the results back.

mod config;
pub use config::{BenchmarkConfig, WorkerConfig};

mod errors;
pub use errors::QueueError;

mod collector;
pub use collector::{Collector, HttpCollector};

mod calibrate;
pub use calibrate::Calibration;

mod worker;
pub use worker::Worker;
