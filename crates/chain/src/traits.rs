use alloy_consensus::Header;
use alloy_primitives::{Address, Bytes, B256, U256};
use enginemock_primitives::ExecutionPayloadV1;

use crate::ChainError;

/// Header of a block known to the chain, together with its total difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHeader {
    pub hash: B256,
    pub header: Header,
    pub total_difficulty: U256,
}

/// Block produced by the chain component, with its hash already computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlock {
    pub hash: B256,
    pub header: Header,

    /// EIP-2718 encoded transactions.
    pub transactions: Vec<Bytes>,
}

/// What the engine asks the chain component to assemble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRequest {
    pub parent_hash: B256,
    pub timestamp: u64,
    pub fee_recipient: Address,
    pub prev_randao: B256,
    pub extra_data: Bytes,
    pub transactions: Vec<Bytes>,
}

/// Interface to the component that owns block assembly and state transition.
///
/// All calls are synchronous and may block the calling thread for the duration of the work.
#[cfg_attr(feature = "test-utils", mockall::automock)]
pub trait ChainProvider: Send + Sync {
    /// Looks up a block header by hash.
    fn header_by_hash(&self, hash: B256) -> Option<ChainHeader>;

    /// Total difficulty that marks the transition to proof-of-stake.
    fn terminal_total_difficulty(&self) -> U256;

    /// Executes a payload on top of its (known) parent and imports it, returning its hash.
    fn execute_payload(&self, payload: &ExecutionPayloadV1) -> Result<B256, ChainError>;

    /// Assembles a new block as described by `request` and imports it.
    fn build_block(&self, request: BlockRequest) -> Result<SealedBlock, ChainError>;
}
