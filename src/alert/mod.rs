//! Alert delivery: HTML message formatting plus the sinks messages go out on.

pub mod message;
pub mod sink;

pub use sink::{AlertSink, StdoutSink, TelegramSink};
