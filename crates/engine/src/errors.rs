use enginemock_chain::ChainError;
use enginemock_primitives::PayloadId;
use thiserror::Error;

/// Failures of engine operations that fall outside the payload status vocabulary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Payload id was never issued or has been evicted.
    #[error("unknown payload {0}")]
    UnknownPayload(PayloadId),

    #[error("payload execution failed: {0}")]
    PayloadExecution(ChainError),

    #[error("payload assembly failed: {0}")]
    PayloadAssembly(ChainError),

    /// Assembled block could not be expressed as a V1 payload.
    #[error("payload conversion failed: {0}")]
    PayloadConversion(String),
}

/// Coarse classification of [`EngineError`], used to pick the wire error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorKind {
    UnknownPayload,
    UnknownHead,
    InvalidAttributes,
    ExecutionFailed,
    AssemblyFailed,
    ConversionFailed,
}

impl EngineError {
    pub fn kind(&self) -> EngineErrorKind {
        match self {
            EngineError::UnknownPayload(_) => EngineErrorKind::UnknownPayload,
            EngineError::PayloadExecution(_) => EngineErrorKind::ExecutionFailed,
            EngineError::PayloadAssembly(ChainError::UnknownParent(_)) => {
                EngineErrorKind::UnknownHead
            }
            EngineError::PayloadAssembly(ChainError::TimestampNotAfterParent { .. }) => {
                EngineErrorKind::InvalidAttributes
            }
            EngineError::PayloadAssembly(_) => EngineErrorKind::AssemblyFailed,
            EngineError::PayloadConversion(_) => EngineErrorKind::ConversionFailed,
        }
    }
}
