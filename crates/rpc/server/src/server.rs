//! Engine API listeners.
//!
//! Two listeners share one set of RPC methods: a plain HTTP one and a WebSocket one. Both sit
//! behind the same middleware stack (CORS, transport guard, request deadline, JWT auth) and stop
//! together when the shutdown token is cancelled.

use std::{fmt, future::Future, io, net::SocketAddr, sync::Arc, time::Duration};

use alloy_rpc_types_engine::JwtSecret;
use enginemock_chain::ChainProvider;
use enginemock_config::RpcConfig;
use enginemock_engine::EngineBackend;
use enginemock_rpc_api::EngineApiServer;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
    service::TowerToHyperService,
};
use jsonrpsee::{
    server::{stop_channel, PingConfig, Server, ServerConfig},
    Methods,
};
use reth_rpc_layer::{AuthLayer, JwtAuthValidator};
use tokio::{net::TcpListener, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{
    connection::{ActivityService, ConnectionActivity},
    create_cors_layer, EngineRpcImpl, RequestDeadlineLayer, ServerError, TransportGuardLayer,
};

/// Pause after a failed `accept` so persistent errors (e.g. out of file descriptors) don't spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Which of the two listeners a connection arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Http,
    Ws,
}

impl ListenerKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Ws => "ws",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Handle to the running listeners.
#[derive(Debug)]
pub struct EngineServerHandle {
    http_addr: SocketAddr,
    ws_addr: SocketAddr,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineServerHandle {
    /// Address the HTTP listener is bound to.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Address the WebSocket listener is bound to.
    pub fn ws_addr(&self) -> SocketAddr {
        self.ws_addr
    }

    /// Stops accepting connections on both listeners. Calling it more than once is a no-op.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("shutting down engine api listeners");
        }
        self.shutdown.cancel();
    }

    /// Waits until both listeners have been closed.
    pub async fn stopped(self) {
        for task in self.tasks {
            if let Err(err) = task.await {
                error!(%err, "engine api listener task failed");
            }
        }
    }
}

/// Binds both listeners and starts serving the Engine API.
///
/// Cancelling `shutdown` (or calling [`EngineServerHandle::shutdown`]) stops both listeners.
pub async fn start_engine_server<C>(
    config: &RpcConfig,
    secret: JwtSecret,
    backend: Arc<EngineBackend<C>>,
    shutdown: CancellationToken,
) -> Result<EngineServerHandle, ServerError>
where
    C: ChainProvider + 'static,
{
    let methods: Methods = EngineRpcImpl::new(backend).into_rpc().into();

    let (http_addr, http_task) = spawn_listener(
        ListenerKind::Http,
        config.http_addr,
        config,
        secret.clone(),
        methods.clone(),
        shutdown.clone(),
    )
    .await?;
    let (ws_addr, ws_task) = match spawn_listener(
        ListenerKind::Ws,
        config.ws_addr,
        config,
        secret,
        methods,
        shutdown.clone(),
    )
    .await
    {
        Ok(listener) => listener,
        Err(err) => {
            // Don't leave the HTTP listener running without its sibling.
            shutdown.cancel();
            return Err(err);
        }
    };

    info!(%http_addr, %ws_addr, "engine api listening");
    Ok(EngineServerHandle {
        http_addr,
        ws_addr,
        shutdown,
        tasks: vec![http_task, ws_task],
    })
}

async fn spawn_listener(
    kind: ListenerKind,
    addr: SocketAddr,
    config: &RpcConfig,
    secret: JwtSecret,
    methods: Methods,
    shutdown: CancellationToken,
) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { kind, addr, source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { kind, addr, source })?;

    let timeouts = config.timeouts;
    let middleware = tower::ServiceBuilder::new()
        .layer(create_cors_layer(&config.cors)?)
        .layer(TransportGuardLayer::new(kind))
        .layer(RequestDeadlineLayer::new(timeouts.request_deadline()))
        .layer(AuthLayer::new(JwtAuthValidator::new(secret)));

    let server_config = match kind {
        ListenerKind::Http => ServerConfig::builder().http_only(),
        ListenerKind::Ws => {
            let builder = ServerConfig::builder().ws_only();
            match timeouts.idle() {
                Some(idle) => builder.enable_ws_ping(
                    PingConfig::new()
                        .ping_interval(idle / 2)
                        .inactive_limit(idle),
                ),
                None => builder,
            }
        }
    };

    let svc_builder = Server::builder()
        .set_config(server_config.build())
        .set_http_middleware(middleware)
        .to_service_builder();
    let (stop_handle, server_handle) = stop_channel();

    let task = tokio::spawn(async move {
        info!(listener = %kind, addr = %local_addr, "listener started");
        let listener = &listener;
        loop {
            let Some((stream, remote)) =
                accept_with_backoff(move || listener.accept(), &shutdown, kind).await
            else {
                break;
            };

            let activity = ConnectionActivity::new(kind, remote);
            let svc = svc_builder
                .clone()
                .build(methods.clone(), stop_handle.clone());
            let svc = TowerToHyperService::new(ActivityService::new(svc, activity.clone()));
            let shutdown = shutdown.clone();

            tokio::spawn(async move {
                let mut builder = auto::Builder::new(TokioExecutor::new());
                if let Some(read_header) = timeouts.read_header() {
                    builder
                        .http1()
                        .timer(TokioTimer::new())
                        .header_read_timeout(read_header);
                }

                // Idle tracking only applies to plain HTTP, upgraded sessions use ws pings.
                let idle = match kind {
                    ListenerKind::Http => timeouts.idle(),
                    ListenerKind::Ws => None,
                };

                let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), svc);
                tokio::pin!(conn);

                let result = tokio::select! {
                    res = conn.as_mut() => res,
                    _ = shutdown.cancelled() => {
                        conn.as_mut().graceful_shutdown();
                        conn.await
                    }
                    _ = activity.idle_for(idle) => {
                        debug!(listener = %kind, %remote, "closing idle connection");
                        conn.as_mut().graceful_shutdown();
                        conn.await
                    }
                };
                activity.closed(&result);
            });
        }

        // Also ends open WebSocket sessions.
        if server_handle.stop().is_err() {
            debug!(listener = %kind, "rpc sessions already stopped");
        }
        info!(listener = %kind, addr = %local_addr, "listener stopped");
    });

    Ok((local_addr, task))
}

/// Waits for the next connection, retrying failed accepts after [`ACCEPT_RETRY_DELAY`]. Returns
/// `None` once `shutdown` is cancelled.
async fn accept_with_backoff<T, F, Fut>(
    mut accept: F,
    shutdown: &CancellationToken,
    kind: ListenerKind,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        tokio::select! {
            res = accept() => match res {
                Ok(conn) => return Some(conn),
                Err(err) => warn!(listener = %kind, %err, "failed to accept connection"),
            },
            _ = shutdown.cancelled() => return None,
        }

        tokio::select! {
            _ = sleep(ACCEPT_RETRY_DELAY) => {}
            _ = shutdown.cancelled() => return None,
        }
    }
}
