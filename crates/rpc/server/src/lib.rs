//! Engine API server: RPC dispatch and the authenticated HTTP and WebSocket transports.

mod connection;
mod cors;
mod errors;
mod layers;
mod rpc;
mod secret;
mod server;

pub use cors::{create_cors_layer, CorsDomainError};
pub use errors::{SecretError, ServerError};
pub use layers::{RequestDeadline, RequestDeadlineLayer, TransportGuard, TransportGuardLayer};
pub use rpc::{
    EngineRpcImpl, INVALID_FORKCHOICE_STATE_CODE, INVALID_PAYLOAD_ATTRIBUTES_CODE,
    PAYLOAD_ASSEMBLY_FAILED_CODE, PAYLOAD_CONVERSION_FAILED_CODE, PAYLOAD_EXECUTION_FAILED_CODE,
    UNKNOWN_PAYLOAD_CODE,
};
pub use secret::{load_jwt_secret, LoadedJwtSecret};
pub use server::{start_engine_server, EngineServerHandle, ListenerKind};

// Only exercised by the integration tests.
#[cfg(test)]
use alloy_genesis as _;
#[cfg(test)]
use serde_json as _;
