use std::num::NonZeroUsize;

use enginemock_primitives::{ExecutionPayloadV1, PayloadId};
use lru::LruCache;
use parking_lot::Mutex;

/// Number of prepared payloads kept around for `getPayload`.
pub const PAYLOAD_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// Prepared payloads keyed by the id handed out to the consensus client.
///
/// Lookups count as a use, so a payload that keeps being fetched is not evicted before one that
/// was never read.
#[derive(Debug)]
pub struct PayloadCache {
    payloads: Mutex<LruCache<PayloadId, ExecutionPayloadV1>>,
}

impl Default for PayloadCache {
    fn default() -> Self {
        Self::new(PAYLOAD_CACHE_CAPACITY)
    }
}

impl PayloadCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            payloads: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Inserts a payload, evicting the least recently used one when full. Returns the payload
    /// previously stored under `id`, if any.
    pub fn put(&self, id: PayloadId, payload: ExecutionPayloadV1) -> Option<ExecutionPayloadV1> {
        self.payloads.lock().put(id, payload)
    }

    pub fn get(&self, id: &PayloadId) -> Option<ExecutionPayloadV1> {
        self.payloads.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.payloads.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, Bloom, Bytes, B256, U256};

    use super::*;

    fn id(n: u64) -> PayloadId {
        PayloadId::new(n.to_be_bytes())
    }

    fn payload(number: u64) -> ExecutionPayloadV1 {
        ExecutionPayloadV1 {
            parent_hash: B256::ZERO,
            fee_recipient: Address::ZERO,
            state_root: B256::ZERO,
            receipts_root: B256::ZERO,
            logs_bloom: Bloom::ZERO,
            prev_randao: B256::ZERO,
            block_number: number,
            gas_limit: 30_000_000,
            gas_used: 0,
            timestamp: number,
            extra_data: Bytes::new(),
            base_fee_per_gas: U256::from(7),
            block_hash: B256::with_last_byte(number as u8),
            transactions: Vec::new(),
        }
    }

    #[test]
    fn get_missing_is_none() {
        let cache = PayloadCache::default();
        assert!(cache.get(&id(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn put_replaces_existing() {
        let cache = PayloadCache::default();
        assert!(cache.put(id(1), payload(1)).is_none());

        let old = cache.put(id(1), payload(2)).unwrap();
        assert_eq!(old.block_number, 1);
        assert_eq!(cache.get(&id(1)).unwrap().block_number, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_least_recently_inserted() {
        let cache = PayloadCache::default();
        for n in 1..=11 {
            cache.put(id(n), payload(n));
        }

        assert_eq!(cache.len(), 10);
        assert!(cache.get(&id(1)).is_none());
        for n in 2..=11 {
            assert_eq!(cache.get(&id(n)).unwrap().block_number, n);
        }
    }

    #[test]
    fn reads_refresh_recency() {
        let cache = PayloadCache::default();
        for n in 1..=10 {
            cache.put(id(n), payload(n));
        }

        // Touching the oldest entry makes the second oldest the eviction candidate.
        assert!(cache.get(&id(1)).is_some());
        cache.put(id(11), payload(11));

        assert!(cache.get(&id(2)).is_none());
        assert!(cache.get(&id(1)).is_some());
        for n in 3..=11 {
            assert!(cache.get(&id(n)).is_some());
        }
    }
}
