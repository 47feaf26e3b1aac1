use std::{fs, path::Path};

use alloy_consensus::{constants::EMPTY_OMMER_ROOT_HASH, Header};
use alloy_eips::eip1559::INITIAL_BASE_FEE;
use alloy_genesis::{Genesis, GenesisAccount};
use alloy_primitives::{keccak256, B256, B64, KECCAK256_EMPTY, U256};
use alloy_trie::{
    root::{state_root_unhashed, storage_root_unhashed},
    TrieAccount, EMPTY_ROOT_HASH,
};
use format_serde_error::SerdeError;

use crate::GenesisError;

/// Reads a geth-style genesis file.
pub fn load_genesis(path: &Path) -> Result<Genesis, GenesisError> {
    let json = fs::read_to_string(path)?;
    let genesis =
        serde_json::from_str::<Genesis>(&json).map_err(|err| SerdeError::new(json, err))?;
    Ok(genesis)
}

fn trie_account(account: &GenesisAccount) -> TrieAccount {
    let storage_root = match &account.storage {
        Some(storage) if !storage.is_empty() => storage_root_unhashed(
            storage
                .iter()
                .map(|(slot, value)| (*slot, U256::from_be_bytes(value.0))),
        ),
        _ => EMPTY_ROOT_HASH,
    };
    let code_hash = match &account.code {
        Some(code) if !code.is_empty() => keccak256(code),
        _ => KECCAK256_EMPTY,
    };

    TrieAccount {
        nonce: account.nonce.unwrap_or_default(),
        balance: account.balance,
        storage_root,
        code_hash,
    }
}

/// Derives the block 0 header from the genesis file.
///
/// The mock chain is always post-London, so a missing base fee falls back to the EIP-1559
/// initial base fee.
pub fn genesis_header(genesis: &Genesis) -> Result<Header, GenesisError> {
    let base_fee = match genesis.base_fee_per_gas {
        Some(fee) => u64::try_from(fee).map_err(|_| GenesisError::BaseFeeOutOfRange(fee))?,
        None => INITIAL_BASE_FEE,
    };
    let state_root = if genesis.alloc.is_empty() {
        EMPTY_ROOT_HASH
    } else {
        state_root_unhashed(
            genesis
                .alloc
                .iter()
                .map(|(address, account)| (*address, trie_account(account))),
        )
    };

    Ok(Header {
        parent_hash: B256::ZERO,
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        beneficiary: genesis.coinbase,
        state_root,
        transactions_root: EMPTY_ROOT_HASH,
        receipts_root: EMPTY_ROOT_HASH,
        difficulty: genesis.difficulty,
        number: 0,
        gas_limit: genesis.gas_limit,
        gas_used: 0,
        timestamp: genesis.timestamp,
        extra_data: genesis.extra_data.clone(),
        mix_hash: genesis.mix_hash,
        nonce: B64::from(genesis.nonce),
        base_fee_per_gas: Some(base_fee),
        ..Default::default()
    })
}
