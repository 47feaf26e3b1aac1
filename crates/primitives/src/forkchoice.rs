use alloy_rpc_types_engine::PayloadId;
use serde::{Deserialize, Serialize};

use crate::PayloadStatusV1;

/// Response of `engine_forkchoiceUpdatedV1`.
///
/// `payloadId` is set only when payload attributes were supplied and a payload was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceUpdatedResult {
    pub payload_status: PayloadStatusV1,
    pub payload_id: Option<PayloadId>,
}

impl ForkchoiceUpdatedResult {
    pub const fn new(payload_status: PayloadStatusV1) -> Self {
        Self {
            payload_status,
            payload_id: None,
        }
    }

    pub fn with_payload_id(mut self, payload_id: PayloadId) -> Self {
        self.payload_id = Some(payload_id);
        self
    }
}
