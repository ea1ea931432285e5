//! Structured request logging.
//!
//! One `LogRecord` per request is handed off through a bounded queue to a
//! background dispatch task, which serializes it once and fans it out to the
//! configured sinks. The hand-off never blocks the request path; records
//! submitted while the queue is full are dropped and counted. Delivery is
//! fire-and-forget: a failing sink is reported through the process's own
//! diagnostic logging and never reaches the caller.

pub mod logger;
pub mod record;
pub mod sinks;

pub use logger::RequestLogger;
pub use record::{LogLevel, LogRecord};
pub use sinks::{ConsoleSink, HttpCollectorSink, LogSink, RollingFileSink};
