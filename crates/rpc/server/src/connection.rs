//! Per-connection bookkeeping: in-flight requests, idle detection and lifecycle logging.

use std::{
    error::Error,
    future::{pending, Future},
    net::SocketAddr,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};

use http::{Response, StatusCode};
use parking_lot::Mutex;
use tokio::time::{sleep, sleep_until, Instant};
use tower::Service;
use tracing::*;

use crate::ListenerKind;

pub(crate) type BoxError = Box<dyn Error + Send + Sync>;

/// How the HTTP side of a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionEnd {
    Closed,
    Failed,
    /// Handed over to a WebSocket session, which outlives the HTTP connection.
    Upgraded,
}

/// Activity of a single client connection.
#[derive(Debug)]
pub(crate) struct ConnectionActivity {
    kind: ListenerKind,
    remote: SocketAddr,
    in_flight: AtomicUsize,
    last_active: Mutex<Instant>,
    upgraded: AtomicBool,
}

impl ConnectionActivity {
    pub(crate) fn new(kind: ListenerKind, remote: SocketAddr) -> Arc<Self> {
        debug!(listener = %kind, %remote, "connection opened");
        Arc::new(Self {
            kind,
            remote,
            in_flight: AtomicUsize::new(0),
            last_active: Mutex::new(Instant::now()),
            upgraded: AtomicBool::new(false),
        })
    }

    fn begin(self: &Arc<Self>) -> InFlightGuard {
        *self.last_active.lock() = Instant::now();
        if self.in_flight.fetch_add(1, Ordering::AcqRel) == 0 {
            debug!(listener = %self.kind, remote = %self.remote, "connection active");
        }
        InFlightGuard(self.clone())
    }

    fn end(&self) {
        *self.last_active.lock() = Instant::now();
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            debug!(listener = %self.kind, remote = %self.remote, "connection idle");
        }
    }

    /// Resolves once the connection has had no request in flight for `idle`. Never resolves
    /// when `idle` is `None`.
    pub(crate) async fn idle_for(&self, idle: Option<Duration>) {
        let Some(idle) = idle else {
            return pending().await;
        };

        loop {
            if self.in_flight.load(Ordering::Acquire) > 0 {
                sleep(idle).await;
                continue;
            }

            let deadline = *self.last_active.lock() + idle;
            if Instant::now() >= deadline {
                return;
            }
            sleep_until(deadline).await;
        }
    }

    fn mark_upgraded(&self) {
        if !self.upgraded.swap(true, Ordering::AcqRel) {
            debug!(listener = %self.kind, remote = %self.remote, "connection upgraded to websocket session");
        }
    }

    pub(crate) fn end_of(&self, result: &Result<(), BoxError>) -> ConnectionEnd {
        if self.upgraded.load(Ordering::Acquire) {
            ConnectionEnd::Upgraded
        } else if result.is_ok() {
            ConnectionEnd::Closed
        } else {
            ConnectionEnd::Failed
        }
    }

    /// Logs the end of the HTTP connection. Upgraded connections are not logged as closed since
    /// their session is still running.
    pub(crate) fn closed(&self, result: &Result<(), BoxError>) {
        match (self.end_of(result), result) {
            (ConnectionEnd::Upgraded, _) => {}
            (_, Ok(())) => debug!(listener = %self.kind, remote = %self.remote, "connection closed"),
            (_, Err(err)) => {
                debug!(listener = %self.kind, remote = %self.remote, %err, "connection closed with error")
            }
        }
    }
}

/// Marks a request as in flight until dropped.
struct InFlightGuard(Arc<ConnectionActivity>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.end();
    }
}

/// Wraps a connection's service to record request activity.
#[derive(Debug, Clone)]
pub(crate) struct ActivityService<S> {
    inner: S,
    activity: Arc<ConnectionActivity>,
}

impl<S> ActivityService<S> {
    pub(crate) fn new(inner: S, activity: Arc<ConnectionActivity>) -> Self {
        Self { inner, activity }
    }
}

impl<S, R, B> Service<R> for ActivityService<S>
where
    S: Service<R, Response = Response<B>>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        let guard = self.activity.begin();
        let activity = self.activity.clone();
        let fut = self.inner.call(req);
        Box::pin(async move {
            let res = fut.await;
            if matches!(&res, Ok(resp) if resp.status() == StatusCode::SWITCHING_PROTOCOLS) {
                activity.mark_upgraded();
            }
            drop(guard);
            res
        })
    }
}
