//! Engine API RPC definitions.

use enginemock_primitives::{
    ExecutionPayloadV1, ForkchoiceState, ForkchoiceUpdatedResult, PayloadAttributes, PayloadId,
    PayloadStatusV1,
};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

/// Paris (V1) Engine API methods.
///
/// Methods are blocking: block assembly and payload execution run synchronously on the
/// calling worker.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "engine"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "engine"))]
pub trait EngineApi {
    /// Returns the payload prepared under `payload_id` by an earlier forkchoice update.
    #[method(name = "getPayloadV1", blocking)]
    fn get_payload_v1(&self, payload_id: PayloadId) -> RpcResult<ExecutionPayloadV1>;

    /// Validates and executes a payload.
    #[method(name = "newPayloadV1", blocking)]
    fn new_payload_v1(&self, payload: ExecutionPayloadV1) -> RpcResult<PayloadStatusV1>;

    /// Updates the forkchoice state, preparing a payload when attributes are given.
    #[method(name = "forkchoiceUpdatedV1", blocking)]
    fn forkchoice_updated_v1(
        &self,
        forkchoice_state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> RpcResult<ForkchoiceUpdatedResult>;
}
