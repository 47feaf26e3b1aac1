use std::sync::atomic::{AtomicU64, Ordering};

use enginemock_primitives::PayloadId;

/// Issues payload ids from a process-local counter.
///
/// The first id is `1`, encoded big-endian. Concurrent callers always get distinct values.
#[derive(Debug, Default)]
pub struct PayloadIdGenerator {
    counter: AtomicU64,
}

impl PayloadIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> PayloadId {
        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        PayloadId::new(id.to_be_bytes())
    }
}
