//! Error types for startup and configuration.

use std::io;

use enginemock_chain::GenesisError;
use enginemock_rpc_server::{SecretError, ServerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InitError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("failed to build runtime: {0}")]
    RuntimeBuild(#[source] io::Error),

    #[error("config parse: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config: {0}")]
    MalformedConfig(#[from] ConfigError),

    #[error("jwt secret: {0}")]
    Secret(#[from] SecretError),

    #[error("genesis: {0}")]
    Genesis(#[from] GenesisError),

    #[error("rpc server: {0}")]
    Server(#[from] ServerError),
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// Override path has an empty segment.
    #[error("missing key in override path: '{0}'")]
    MissingKey(String),

    /// Tried to traverse into a primitive.
    #[error("can't traverse into non-table key '{key}' of '{path}'")]
    TraverseNonTableAt { key: String, path: String },

    /// Invalid override string.
    #[error("invalid override: '{0}'")]
    InvalidOverride(String),
}
