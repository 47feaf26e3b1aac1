use std::collections::HashMap;

use alloy_consensus::{constants::EMPTY_OMMER_ROOT_HASH, Header};
use alloy_eips::eip1559::{calc_next_block_base_fee, BaseFeeParams, INITIAL_BASE_FEE};
use alloy_genesis::Genesis;
use alloy_primitives::{Bytes, B256, B64, U256};
use alloy_trie::EMPTY_ROOT_HASH;
use enginemock_primitives::ExecutionPayloadV1;
use parking_lot::RwLock;
use tracing::*;

use crate::{
    block_hash::{header_from_payload, transactions_root},
    genesis::genesis_header,
    BlockRequest, ChainError, ChainHeader, ChainProvider, GenesisError, SealedBlock,
};

#[derive(Debug, Clone)]
struct StoredBlock {
    header: Header,
    transactions: Vec<Bytes>,
    total_difficulty: U256,
}

/// In-memory chain seeded from a genesis file.
///
/// Blocks are never executed against real state: assembled blocks inherit the parent state root
/// and imported payloads are only checked for consistency with their parent.
#[derive(Debug)]
pub struct MockChain {
    genesis_hash: B256,
    terminal_total_difficulty: U256,
    blocks: RwLock<HashMap<B256, StoredBlock>>,
}

impl MockChain {
    /// Creates a chain holding only the genesis block.
    pub fn from_genesis(genesis: &Genesis) -> Result<Self, GenesisError> {
        let header = genesis_header(genesis)?;
        let genesis_hash = header.hash_slow();
        let terminal_total_difficulty = match genesis.config.terminal_total_difficulty {
            Some(ttd) => ttd,
            None => {
                warn!("genesis config has no terminal total difficulty, assuming 0");
                U256::ZERO
            }
        };

        let genesis_block = StoredBlock {
            total_difficulty: header.difficulty,
            header,
            transactions: Vec::new(),
        };
        let blocks = HashMap::from([(genesis_hash, genesis_block)]);

        info!(%genesis_hash, %terminal_total_difficulty, "initialized mock chain");
        Ok(Self {
            genesis_hash,
            terminal_total_difficulty,
            blocks: RwLock::new(blocks),
        })
    }

    pub fn genesis_hash(&self) -> B256 {
        self.genesis_hash
    }

    /// Number of blocks known to the chain, genesis included.
    pub fn block_count(&self) -> usize {
        self.blocks.read().len()
    }

    /// Transactions of a known block.
    pub fn block_transactions(&self, hash: B256) -> Option<Vec<Bytes>> {
        self.blocks
            .read()
            .get(&hash)
            .map(|block| block.transactions.clone())
    }

    fn import(&self, hash: B256, header: Header, transactions: Vec<Bytes>, parent_td: U256) {
        let total_difficulty = parent_td + header.difficulty;
        debug!(%hash, number = header.number, %total_difficulty, "importing block");
        self.blocks.write().insert(
            hash,
            StoredBlock {
                header,
                transactions,
                total_difficulty,
            },
        );
    }

    fn parent(&self, hash: B256) -> Result<ChainHeader, ChainError> {
        self.header_by_hash(hash)
            .ok_or(ChainError::UnknownParent(hash))
    }
}

impl ChainProvider for MockChain {
    fn header_by_hash(&self, hash: B256) -> Option<ChainHeader> {
        self.blocks.read().get(&hash).map(|block| ChainHeader {
            hash,
            header: block.header.clone(),
            total_difficulty: block.total_difficulty,
        })
    }

    fn terminal_total_difficulty(&self) -> U256 {
        self.terminal_total_difficulty
    }

    fn execute_payload(&self, payload: &ExecutionPayloadV1) -> Result<B256, ChainError> {
        let header = header_from_payload(payload)?;
        let parent = self.parent(header.parent_hash)?;

        if header.number != parent.header.number + 1 {
            return Err(ChainError::InvalidBlockNumber {
                parent: parent.header.number,
                got: header.number,
            });
        }
        if header.timestamp <= parent.header.timestamp {
            return Err(ChainError::TimestampNotAfterParent {
                timestamp: header.timestamp,
                parent_timestamp: parent.header.timestamp,
            });
        }
        if header.gas_used > header.gas_limit {
            return Err(ChainError::GasLimitExceeded {
                used: header.gas_used,
                limit: header.gas_limit,
            });
        }

        let hash = header.hash_slow();
        self.import(
            hash,
            header,
            payload.transactions.clone(),
            parent.total_difficulty,
        );
        Ok(hash)
    }

    fn build_block(&self, request: BlockRequest) -> Result<SealedBlock, ChainError> {
        let parent = self.parent(request.parent_hash)?;
        if request.timestamp <= parent.header.timestamp {
            return Err(ChainError::TimestampNotAfterParent {
                timestamp: request.timestamp,
                parent_timestamp: parent.header.timestamp,
            });
        }

        let base_fee = match parent.header.base_fee_per_gas {
            Some(fee) => calc_next_block_base_fee(
                parent.header.gas_used,
                parent.header.gas_limit,
                fee,
                BaseFeeParams::ethereum(),
            ),
            None => INITIAL_BASE_FEE,
        };

        let header = Header {
            parent_hash: parent.hash,
            ommers_hash: EMPTY_OMMER_ROOT_HASH,
            beneficiary: request.fee_recipient,
            state_root: parent.header.state_root,
            transactions_root: transactions_root(&request.transactions),
            receipts_root: EMPTY_ROOT_HASH,
            difficulty: U256::ZERO,
            number: parent.header.number + 1,
            gas_limit: parent.header.gas_limit,
            gas_used: 0,
            timestamp: request.timestamp,
            extra_data: request.extra_data,
            mix_hash: request.prev_randao,
            nonce: B64::ZERO,
            base_fee_per_gas: Some(base_fee),
            ..Default::default()
        };
        let hash = header.hash_slow();

        self.import(
            hash,
            header.clone(),
            request.transactions.clone(),
            parent.total_difficulty,
        );
        Ok(SealedBlock {
            hash,
            header,
            transactions: request.transactions,
        })
    }
}
