//! Engine API dispatch.

use std::sync::Arc;

use enginemock_chain::ChainProvider;
use enginemock_engine::{EngineBackend, EngineError, EngineErrorKind};
use enginemock_primitives::{
    ExecutionPayloadV1, ForkchoiceState, ForkchoiceUpdatedResult, PayloadAttributes, PayloadId,
    PayloadStatusV1,
};
use enginemock_rpc_api::EngineApiServer;
use jsonrpsee::{core::RpcResult, types::ErrorObjectOwned};

/// Requested payload is not in the payload cache.
pub const UNKNOWN_PAYLOAD_CODE: i32 = -38001;

/// Payload was requested on top of a head block we don't know.
pub const INVALID_FORKCHOICE_STATE_CODE: i32 = -38002;

/// Payload attributes are inconsistent with the head block.
pub const INVALID_PAYLOAD_ATTRIBUTES_CODE: i32 = -38003;

pub const PAYLOAD_EXECUTION_FAILED_CODE: i32 = -32001;
pub const PAYLOAD_ASSEMBLY_FAILED_CODE: i32 = -32002;
pub const PAYLOAD_CONVERSION_FAILED_CODE: i32 = -32003;

/// Wire code and message for each kind of engine failure.
const fn error_code(kind: EngineErrorKind) -> (i32, &'static str) {
    match kind {
        EngineErrorKind::UnknownPayload => (UNKNOWN_PAYLOAD_CODE, "Unknown payload"),
        EngineErrorKind::UnknownHead => (INVALID_FORKCHOICE_STATE_CODE, "Invalid forkchoice state"),
        EngineErrorKind::InvalidAttributes => {
            (INVALID_PAYLOAD_ATTRIBUTES_CODE, "Invalid payload attributes")
        }
        EngineErrorKind::ExecutionFailed => {
            (PAYLOAD_EXECUTION_FAILED_CODE, "Payload execution failed")
        }
        EngineErrorKind::AssemblyFailed => (PAYLOAD_ASSEMBLY_FAILED_CODE, "Payload assembly failed"),
        EngineErrorKind::ConversionFailed => {
            (PAYLOAD_CONVERSION_FAILED_CODE, "Payload conversion failed")
        }
    }
}

/// Creates an RPC error for an engine failure, with the error text as data.
fn engine_error(err: EngineError) -> ErrorObjectOwned {
    let (code, message) = error_code(err.kind());
    ErrorObjectOwned::owned(code, message, Some(err.to_string()))
}

/// Engine API RPC server implementation.
#[derive(Debug)]
pub struct EngineRpcImpl<C> {
    backend: Arc<EngineBackend<C>>,
}

impl<C> EngineRpcImpl<C> {
    /// Creates a new [`EngineRpcImpl`].
    pub fn new(backend: Arc<EngineBackend<C>>) -> Self {
        Self { backend }
    }
}

impl<C: ChainProvider + 'static> EngineApiServer for EngineRpcImpl<C> {
    fn get_payload_v1(&self, payload_id: PayloadId) -> RpcResult<ExecutionPayloadV1> {
        self.backend.get_payload(payload_id).map_err(engine_error)
    }

    fn new_payload_v1(&self, payload: ExecutionPayloadV1) -> RpcResult<PayloadStatusV1> {
        self.backend.new_payload(&payload).map_err(engine_error)
    }

    fn forkchoice_updated_v1(
        &self,
        forkchoice_state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> RpcResult<ForkchoiceUpdatedResult> {
        self.backend
            .forkchoice_updated(&forkchoice_state, payload_attributes.as_ref())
            .map_err(engine_error)
    }
}
