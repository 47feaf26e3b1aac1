use std::{num::NonZeroUsize, sync::Arc};

use alloy_primitives::Bytes;
use enginemock_chain::{block_to_payload, payload_block_hash, BlockRequest, ChainProvider};
use enginemock_primitives::{
    ExecutionPayloadV1, ForkchoiceState, ForkchoiceUpdatedResult, PayloadAttributes, PayloadId,
    PayloadStatusV1,
};
use tracing::*;

use crate::{EngineError, PayloadCache, PayloadIdGenerator, PAYLOAD_CACHE_CAPACITY};

/// Forkchoice and payload validation state machine.
///
/// Owns the only mutable state of the engine (issued ids and prepared payloads). Everything else
/// is delegated to the chain component. All methods take `&self` and may be called concurrently.
#[derive(Debug)]
pub struct EngineBackend<C> {
    chain: Arc<C>,
    ids: PayloadIdGenerator,
    payloads: PayloadCache,
}

impl<C: ChainProvider> EngineBackend<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self::with_cache_capacity(chain, PAYLOAD_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(chain: Arc<C>, capacity: NonZeroUsize) -> Self {
        Self {
            chain,
            ids: PayloadIdGenerator::new(),
            payloads: PayloadCache::new(capacity),
        }
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    /// Returns a payload previously prepared by [`Self::forkchoice_updated`].
    pub fn get_payload(&self, id: PayloadId) -> Result<ExecutionPayloadV1, EngineError> {
        match self.payloads.get(&id) {
            Some(payload) => {
                debug!(%id, block_hash = %payload.block_hash, "serving prepared payload");
                Ok(payload)
            }
            None => {
                warn!(%id, "cannot get unknown payload");
                Err(EngineError::UnknownPayload(id))
            }
        }
    }

    /// Validates a payload and, if it extends a post-merge block we know, executes it.
    ///
    /// Checks run in a fixed order: block hash integrity, parent lookup, terminal total
    /// difficulty, then execution. Only an execution failure is reported as an error.
    pub fn new_payload(&self, payload: &ExecutionPayloadV1) -> Result<PayloadStatusV1, EngineError> {
        match payload_block_hash(payload) {
            Ok(hash) if hash == payload.block_hash => {}
            Ok(hash) => {
                debug!(declared = %payload.block_hash, computed = %hash, "payload block hash mismatch");
                return Ok(PayloadStatusV1::invalid_block_hash());
            }
            Err(err) => {
                debug!(declared = %payload.block_hash, %err, "cannot compute payload block hash");
                return Ok(PayloadStatusV1::invalid_block_hash());
            }
        }

        let Some(parent) = self.chain.header_by_hash(payload.parent_hash) else {
            warn!(parent_hash = %payload.parent_hash, "cannot execute payload, parent is unknown");
            return Ok(PayloadStatusV1::syncing());
        };

        let ttd = self.chain.terminal_total_difficulty();
        if parent.total_difficulty < ttd {
            warn!(
                parent_hash = %payload.parent_hash,
                total_difficulty = %parent.total_difficulty,
                %ttd,
                "parent block not yet at terminal total difficulty"
            );
            return Ok(PayloadStatusV1::invalid_terminal_block());
        }

        let hash = self.chain.execute_payload(payload).map_err(|err| {
            error!(block_hash = %payload.block_hash, %err, "failed to execute payload");
            EngineError::PayloadExecution(err)
        })?;

        info!(block_hash = %hash, number = payload.block_number, "executed payload");
        Ok(PayloadStatusV1::valid(hash))
    }

    /// Records the consensus client's forkchoice and optionally prepares a new payload on top of
    /// the head.
    pub fn forkchoice_updated(
        &self,
        state: &ForkchoiceState,
        attributes: Option<&PayloadAttributes>,
    ) -> Result<ForkchoiceUpdatedResult, EngineError> {
        info!(
            head = %state.head_block_hash,
            safe = %state.safe_block_hash,
            finalized = %state.finalized_block_hash,
            "forkchoice updated"
        );

        let status = PayloadStatusV1::valid(state.head_block_hash);
        let Some(attributes) = attributes else {
            return Ok(ForkchoiceUpdatedResult::new(status));
        };

        let id = self.ids.next_id();
        info!(
            %id,
            timestamp = attributes.timestamp,
            fee_recipient = %attributes.suggested_fee_recipient,
            "preparing new payload"
        );

        let request = BlockRequest {
            parent_hash: state.head_block_hash,
            timestamp: attributes.timestamp,
            fee_recipient: attributes.suggested_fee_recipient,
            prev_randao: attributes.prev_randao,
            extra_data: Bytes::new(),
            transactions: Vec::new(),
        };
        let block = self.chain.build_block(request).map_err(|err| {
            error!(%id, %err, "failed to assemble payload");
            EngineError::PayloadAssembly(err)
        })?;

        let payload = block_to_payload(&block).map_err(|err| {
            error!(%id, block_hash = %block.hash, %err, "failed to convert assembled block");
            EngineError::PayloadConversion(err.to_string())
        })?;

        debug!(%id, block_hash = %payload.block_hash, number = payload.block_number, "caching prepared payload");
        self.payloads.put(id, payload);

        Ok(ForkchoiceUpdatedResult::new(status).with_payload_id(id))
    }
}
