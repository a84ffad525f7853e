//! Logging subsystem built on `tracing-subscriber`.

pub mod manager;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use manager::init;
pub use service::{init_logging_from_config, LoggingInitConfig};
// Re-export tracing-appender types for convenience
pub use tracing_appender::rolling::Rotation;
pub use types::{LogFileSink, LogFormat, LoggerConfig};
