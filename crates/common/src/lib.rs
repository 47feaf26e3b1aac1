//! Utilities shared by the mock engine binaries.

pub mod logging;
