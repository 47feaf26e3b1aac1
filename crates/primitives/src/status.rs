use std::fmt;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Validation outcome of a payload, as reported by `engine_newPayloadV1` and
/// `engine_forkchoiceUpdatedV1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Valid,
    Invalid,
    Syncing,
    InvalidBlockHash,
    InvalidTerminalBlock,
}

impl ExecutionStatus {
    /// Returns the string used on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
            Self::Syncing => "SYNCING",
            Self::InvalidBlockHash => "INVALID_BLOCK_HASH",
            Self::InvalidTerminalBlock => "INVALID_TERMINAL_BLOCK",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `PayloadStatusV1` object.
///
/// Exactly one status is attached; `latestValidHash` and `validationError` are only present
/// when they carry information for that status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatusV1 {
    pub status: ExecutionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_valid_hash: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl PayloadStatusV1 {
    /// Creates a status with neither a latest valid hash nor a validation error.
    pub const fn from_status(status: ExecutionStatus) -> Self {
        Self {
            status,
            latest_valid_hash: None,
            validation_error: None,
        }
    }

    /// `VALID`, anchored at `latest_valid_hash`.
    pub const fn valid(latest_valid_hash: B256) -> Self {
        Self {
            status: ExecutionStatus::Valid,
            latest_valid_hash: Some(latest_valid_hash),
            validation_error: None,
        }
    }

    pub const fn syncing() -> Self {
        Self::from_status(ExecutionStatus::Syncing)
    }

    pub const fn invalid_block_hash() -> Self {
        Self::from_status(ExecutionStatus::InvalidBlockHash)
    }

    pub const fn invalid_terminal_block() -> Self {
        Self::from_status(ExecutionStatus::InvalidTerminalBlock)
    }

    /// `INVALID` with an explanation and, when known, the last valid ancestor.
    pub fn invalid(latest_valid_hash: Option<B256>, validation_error: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Invalid,
            latest_valid_hash,
            validation_error: Some(validation_error.into()),
        }
    }

    pub const fn is_valid(&self) -> bool {
        matches!(self.status, ExecutionStatus::Valid)
    }
}
