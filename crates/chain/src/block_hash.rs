//! Conversions between consensus headers and V1 execution payloads.

use alloy_consensus::{constants::EMPTY_OMMER_ROOT_HASH, Header};
use alloy_primitives::{Bytes, B256, B64, U256};
use alloy_trie::root::ordered_trie_root_with_encoder;
use enginemock_primitives::ExecutionPayloadV1;

use crate::{ChainError, SealedBlock};

/// Computes the transactions root over raw, already encoded transactions.
pub(crate) fn transactions_root(transactions: &[Bytes]) -> B256 {
    ordered_trie_root_with_encoder(transactions, |tx, buf| buf.extend_from_slice(tx))
}

/// Rebuilds the header committed to by a V1 payload.
///
/// Fields a post-merge block fixes (ommers hash, difficulty, nonce) take their constant values.
pub fn header_from_payload(payload: &ExecutionPayloadV1) -> Result<Header, ChainError> {
    let base_fee: u64 = payload
        .base_fee_per_gas
        .try_into()
        .map_err(|_| ChainError::BaseFeeOutOfRange(payload.base_fee_per_gas.to_string()))?;

    Ok(Header {
        parent_hash: payload.parent_hash,
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        beneficiary: payload.fee_recipient,
        state_root: payload.state_root,
        transactions_root: transactions_root(&payload.transactions),
        receipts_root: payload.receipts_root,
        logs_bloom: payload.logs_bloom,
        difficulty: U256::ZERO,
        number: payload.block_number,
        gas_limit: payload.gas_limit,
        gas_used: payload.gas_used,
        timestamp: payload.timestamp,
        extra_data: payload.extra_data.clone(),
        mix_hash: payload.prev_randao,
        nonce: B64::ZERO,
        base_fee_per_gas: Some(base_fee),
        ..Default::default()
    })
}

/// Hash of the header the payload commits to.
///
/// Comparing this with `payload.block_hash` tells whether the payload is internally consistent.
pub fn payload_block_hash(payload: &ExecutionPayloadV1) -> Result<B256, ChainError> {
    Ok(header_from_payload(payload)?.hash_slow())
}

/// Converts an assembled block into its wire representation.
pub fn block_to_payload(block: &SealedBlock) -> Result<ExecutionPayloadV1, ChainError> {
    let header = &block.header;
    let base_fee = header
        .base_fee_per_gas
        .ok_or(ChainError::MissingBaseFee(block.hash))?;

    Ok(ExecutionPayloadV1 {
        parent_hash: header.parent_hash,
        fee_recipient: header.beneficiary,
        state_root: header.state_root,
        receipts_root: header.receipts_root,
        logs_bloom: header.logs_bloom,
        prev_randao: header.mix_hash,
        block_number: header.number,
        gas_limit: header.gas_limit,
        gas_used: header.gas_used,
        timestamp: header.timestamp,
        extra_data: header.extra_data.clone(),
        base_fee_per_gas: U256::from(base_fee),
        block_hash: block.hash,
        transactions: block.transactions.clone(),
    })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, Bloom};
    use alloy_trie::EMPTY_ROOT_HASH;

    use super::*;

    fn sealed_block(transactions: Vec<Bytes>) -> SealedBlock {
        let header = Header {
            parent_hash: B256::repeat_byte(0x11),
            ommers_hash: EMPTY_OMMER_ROOT_HASH,
            beneficiary: Address::repeat_byte(0x22),
            state_root: B256::repeat_byte(0x33),
            transactions_root: transactions_root(&transactions),
            receipts_root: EMPTY_ROOT_HASH,
            logs_bloom: Bloom::ZERO,
            number: 7,
            gas_limit: 30_000_000,
            gas_used: 21_000,
            timestamp: 1_000,
            mix_hash: B256::repeat_byte(0x44),
            base_fee_per_gas: Some(875_000_000),
            ..Default::default()
        };
        SealedBlock {
            hash: header.hash_slow(),
            header,
            transactions,
        }
    }

    #[test]
    fn empty_transactions_root_is_empty_trie() {
        assert_eq!(transactions_root(&[]), EMPTY_ROOT_HASH);
    }

    #[test]
    fn payload_hash_matches_block_hash() {
        let block = sealed_block(vec![Bytes::from_static(&[0x02, 0xc0, 0x01])]);
        let payload = block_to_payload(&block).unwrap();
        assert_eq!(payload_block_hash(&payload).unwrap(), block.hash);
        assert_eq!(header_from_payload(&payload).unwrap(), block.header);
    }

    #[test]
    fn tampered_payload_changes_hash() {
        let block = sealed_block(Vec::new());
        let mut payload = block_to_payload(&block).unwrap();
        payload.gas_used += 1;
        assert_ne!(payload_block_hash(&payload).unwrap(), payload.block_hash);
    }

    #[test]
    fn missing_base_fee_cannot_be_converted() {
        let mut block = sealed_block(Vec::new());
        block.header.base_fee_per_gas = None;
        assert!(matches!(
            block_to_payload(&block),
            Err(ChainError::MissingBaseFee(hash)) if hash == block.hash
        ));
    }

    #[test]
    fn oversized_base_fee_is_rejected() {
        let block = sealed_block(Vec::new());
        let mut payload = block_to_payload(&block).unwrap();
        payload.base_fee_per_gas = U256::MAX;
        assert!(matches!(
            payload_block_hash(&payload),
            Err(ChainError::BaseFeeOutOfRange(_))
        ));
    }
}
