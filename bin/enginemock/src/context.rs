//! Startup: loads the secret and genesis and wires the engine together.

use std::sync::Arc;

use enginemock_chain::{load_genesis, ChainProvider, MockChain};
use enginemock_config::Config;
use enginemock_engine::EngineBackend;
use enginemock_rpc_server::{load_jwt_secret, LoadedJwtSecret};
use tracing::*;

use crate::errors::InitError;

/// Everything the RPC server needs, built from the loaded config.
#[derive(Debug)]
pub(crate) struct EngineContext {
    pub(crate) jwt: LoadedJwtSecret,
    pub(crate) backend: Arc<EngineBackend<MockChain>>,
}

pub(crate) fn init_engine_context(config: &Config) -> Result<EngineContext, InitError> {
    let jwt = load_jwt_secret(&config.chain.jwt_secret_path)?;
    info!(
        path = %config.chain.jwt_secret_path.display(),
        fingerprint = %jwt.fingerprint,
        "loaded jwt secret"
    );

    let genesis = load_genesis(&config.chain.genesis_path)?;
    let chain = MockChain::from_genesis(&genesis)?;
    info!(
        path = %config.chain.genesis_path.display(),
        genesis_hash = %chain.genesis_hash(),
        ttd = %chain.terminal_total_difficulty(),
        "initialized chain from genesis"
    );

    let backend = Arc::new(EngineBackend::new(Arc::new(chain)));
    Ok(EngineContext { jwt, backend })
}
