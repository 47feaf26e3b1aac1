//! Configuration types for the mock engine.

mod config;

pub use config::{ChainConfig, Config, LoggingConfig, RpcConfig, TimeoutConfig};
