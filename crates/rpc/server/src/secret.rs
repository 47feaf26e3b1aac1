use std::{fs, path::Path};

use alloy_primitives::keccak256;
use alloy_rpc_types_engine::JwtSecret;
use tracing::*;

use crate::SecretError;

const JWT_SECRET_LEN: usize = 32;

/// JWT secret together with a printable fingerprint of it.
#[derive(Debug, Clone)]
pub struct LoadedJwtSecret {
    pub secret: JwtSecret,

    /// First bytes of the secret's keccak hash, safe to log.
    pub fingerprint: String,
}

/// Loads the shared JWT secret from a file holding a single line of hex, optionally `0x`
/// prefixed. The secret must decode to exactly 32 bytes.
pub fn load_jwt_secret(path: &Path) -> Result<LoadedJwtSecret, SecretError> {
    let contents = fs::read_to_string(path).map_err(|source| SecretError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let hex_str = contents.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);

    let bytes = hex::decode(hex_str)?;
    if bytes.len() != JWT_SECRET_LEN {
        return Err(SecretError::InvalidLength(bytes.len()));
    }

    let secret = JwtSecret::from_hex(hex_str)?;
    let fingerprint = hex::encode(&keccak256(&bytes)[..4]);
    debug!(path = %path.display(), %fingerprint, "loaded jwt secret");

    Ok(LoadedJwtSecret {
        secret,
        fingerprint,
    })
}
