//! Engine API wire types served by the mock execution engine.
//!
//! Most payload-level structures come straight from `alloy-rpc-types-engine`. The V1 status
//! vocabulary (which still carries `INVALID_BLOCK_HASH` and `INVALID_TERMINAL_BLOCK`) and the
//! forkchoice response built around it are defined here.

mod forkchoice;
mod status;

pub use alloy_rpc_types_engine::{ExecutionPayloadV1, ForkchoiceState, PayloadAttributes, PayloadId};
pub use forkchoice::ForkchoiceUpdatedResult;
pub use status::{ExecutionStatus, PayloadStatusV1};
