use std::io;

use alloy_primitives::B256;
use format_serde_error::SerdeError;
use thiserror::Error;

/// Failures reported by the chain component while assembling or executing blocks.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The block to build on or execute against is not part of the chain.
    #[error("unknown parent block {0}")]
    UnknownParent(B256),

    #[error("timestamp {timestamp} is not after parent timestamp {parent_timestamp}")]
    TimestampNotAfterParent { timestamp: u64, parent_timestamp: u64 },

    #[error("block number {got} does not follow parent number {parent}")]
    InvalidBlockNumber { parent: u64, got: u64 },

    #[error("gas used {used} exceeds gas limit {limit}")]
    GasLimitExceeded { used: u64, limit: u64 },

    /// Block header lacks a base fee, so it cannot be expressed as a V1 payload.
    #[error("block {0} has no base fee")]
    MissingBaseFee(B256),

    /// Payload base fee does not fit the header representation.
    #[error("base fee {0} out of range")]
    BaseFeeOutOfRange(String),
}

/// Failures while loading the genesis configuration.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("unparsable genesis file: {0}")]
    Unparsable(#[from] SerdeError),

    #[error("genesis base fee {0} out of range")]
    BaseFeeOutOfRange(u128),
}
