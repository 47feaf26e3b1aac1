//! Logging subsystem.

pub mod manager;
pub mod service;
pub mod types;

// Re-export main types and functions
pub use manager::init;
pub use service::{init_logging_from_config, LoggingInitConfig};
pub use types::{FileLoggingConfig, LoggerConfig, StdoutConfig};
