//! Mock Engine API execution engine binary entrypoint.

use std::future::Future;

use anyhow::{anyhow, Result};
use argh::from_env;
use enginemock_common::logging;
use enginemock_config::Config;
use enginemock_rpc_server::{start_engine_server, EngineServerHandle};
use tokio::runtime;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{args::Args, context::init_engine_context, errors::InitError};

mod args;
mod config;
mod context;
mod errors;

fn main() -> Result<()> {
    let args: Args = from_env();

    // Load config early to initialize logging with config settings
    let config =
        config::get_config(&args).map_err(|e| anyhow!("Failed to load configuration: {e}"))?;
    init_logging(&config);

    let rt = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("enginemock-rt")
        .build()
        .map_err(InitError::RuntimeBuild)?;

    if let Err(err) = rt.block_on(run(config)) {
        error!(%err, "enginemock failed");
        return Err(err.into());
    }

    info!("Exiting enginemock");
    Ok(())
}

async fn run(config: Config) -> Result<(), InitError> {
    let ctx = init_engine_context(&config)?;

    let handle = start_engine_server(
        &config.rpc,
        ctx.jwt.secret,
        ctx.backend,
        CancellationToken::new(),
    )
    .await?;
    info!(
        http = %handle.http_addr(),
        ws = %handle.ws_addr(),
        "engine api listening"
    );

    serve_until(handle, wait_for_signal()).await
}

/// Keeps the listeners up until `signal` resolves, then closes both. The listeners are closed
/// even when waiting for the signal fails.
async fn serve_until(
    handle: EngineServerHandle,
    signal: impl Future<Output = Result<(), InitError>>,
) -> Result<(), InitError> {
    let res = signal.await;
    match &res {
        Ok(()) => info!("received shutdown signal"),
        Err(err) => error!(%err, "failed to wait for shutdown signal"),
    }

    handle.shutdown();
    handle.stopped().await;
    res
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<(), InitError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<(), InitError> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

fn init_logging(config: &Config) {
    logging::init_logging_from_config(logging::LoggingInitConfig {
        service_name: "enginemock",
        log_dir: config.logging.log_dir.as_ref(),
        log_file_prefix: config.logging.log_file_prefix.as_deref(),
        json_format: config.logging.json_format,
        default_log_prefix: "enginemock",
    });
}
