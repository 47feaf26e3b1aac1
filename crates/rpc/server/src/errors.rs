use std::{io, net::SocketAddr, path::PathBuf};

use alloy_rpc_types_engine::JwtError;
use thiserror::Error;

use crate::{CorsDomainError, ListenerKind};

/// Failures while loading the JWT secret file.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("cannot read jwt secret {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("jwt secret is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("jwt secret must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid jwt secret: {0}")]
    Jwt(#[from] JwtError),
}

/// Failures while starting the Engine API listeners.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {kind} listener on {addr}: {source}")]
    Bind {
        kind: ListenerKind,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("invalid cors configuration: {0}")]
    Cors(#[from] CorsDomainError),
}
