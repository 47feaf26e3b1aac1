//! Engine API core: payload id issuance, the prepared payload cache and the
//! forkchoice/validation state machine.

mod backend;
mod cache;
mod errors;
mod payload_id;

pub use backend::EngineBackend;
pub use cache::{PayloadCache, PAYLOAD_CACHE_CAPACITY};
pub use errors::{EngineError, EngineErrorKind};
pub use payload_id::PayloadIdGenerator;
