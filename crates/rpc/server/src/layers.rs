//! HTTP middleware shared by both listeners.

use std::{
    future::{ready, Future},
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use http::StatusCode;
use jsonrpsee::server::{HttpBody, HttpRequest, HttpResponse};
use tower::{Layer, Service};
use tracing::*;

use crate::ListenerKind;

/// Path the WebSocket listener serves in addition to `/`.
const WS_PATH: &str = "/ws";

const WRONG_PORT_MESSAGE: &str = "wrong port, use the websocket port";

type BoxedResponseFuture<E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + Send>>;

fn plain_response(status: StatusCode, body: &str) -> HttpResponse {
    let mut response = HttpResponse::new(HttpBody::from(body.to_string()));
    *response.status_mut() = status;
    response
}

/// Rejects requests that reached the wrong listener.
///
/// On the HTTP listener, requests to the WebSocket path get a 400 instead of being dispatched.
#[derive(Debug, Clone, Copy)]
pub struct TransportGuardLayer {
    kind: ListenerKind,
}

impl TransportGuardLayer {
    pub fn new(kind: ListenerKind) -> Self {
        Self { kind }
    }
}

impl<S> Layer<S> for TransportGuardLayer {
    type Service = TransportGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TransportGuard {
            kind: self.kind,
            inner,
        }
    }
}

/// Service created by [`TransportGuardLayer`].
#[derive(Debug, Clone)]
pub struct TransportGuard<S> {
    kind: ListenerKind,
    inner: S,
}

impl<S> Service<HttpRequest> for TransportGuard<S>
where
    S: Service<HttpRequest, Response = HttpResponse>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = HttpResponse;
    type Error = S::Error;
    type Future = BoxedResponseFuture<S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        if self.kind == ListenerKind::Http && req.uri().path() == WS_PATH {
            warn!(path = WS_PATH, "websocket request on the http listener");
            return Box::pin(ready(Ok(plain_response(
                StatusCode::BAD_REQUEST,
                WRONG_PORT_MESSAGE,
            ))));
        }
        Box::pin(self.inner.call(req))
    }
}

/// Bounds the time spent serving a single request, answering 408 once it runs out.
///
/// `None` disables the deadline.
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadlineLayer {
    deadline: Option<Duration>,
}

impl RequestDeadlineLayer {
    pub fn new(deadline: Option<Duration>) -> Self {
        Self { deadline }
    }
}

impl<S> Layer<S> for RequestDeadlineLayer {
    type Service = RequestDeadline<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestDeadline {
            deadline: self.deadline,
            inner,
        }
    }
}

/// Service created by [`RequestDeadlineLayer`].
#[derive(Debug, Clone)]
pub struct RequestDeadline<S> {
    deadline: Option<Duration>,
    inner: S,
}

impl<S> Service<HttpRequest> for RequestDeadline<S>
where
    S: Service<HttpRequest, Response = HttpResponse>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = HttpResponse;
    type Error = S::Error;
    type Future = BoxedResponseFuture<S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let fut = self.inner.call(req);
        let Some(deadline) = self.deadline else {
            return Box::pin(fut);
        };

        Box::pin(async move {
            match tokio::time::timeout(deadline, fut).await {
                Ok(res) => res,
                Err(_) => {
                    warn!(?deadline, "request deadline exceeded");
                    Ok(plain_response(
                        StatusCode::REQUEST_TIMEOUT,
                        "request deadline exceeded",
                    ))
                }
            }
        })
    }
}
