//! Chain component backing the mock engine.
//!
//! The engine never assembles or executes blocks itself. It goes through [`ChainProvider`],
//! which the binary satisfies with [`MockChain`], an in-memory chain seeded from a genesis file.

mod block_hash;
mod errors;
mod genesis;
mod mock;
mod traits;

pub use block_hash::{block_to_payload, header_from_payload, payload_block_hash};
pub use errors::{ChainError, GenesisError};
pub use genesis::{genesis_header, load_genesis};
pub use mock::MockChain;
#[cfg(feature = "test-utils")]
pub use traits::MockChainProvider;
pub use traits::{BlockRequest, ChainHeader, ChainProvider, SealedBlock};
