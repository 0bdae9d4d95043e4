use axum::extract::Request;
use axum::response::Response;
use axum::routing::future::RouteFuture;
use axum::serve::IncomingStream;
use axum::Router;
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;
use tracing::trace;

use super::tracker::ConnectionId;
use super::Lifecycle;

/// Registered for as long as the transport connection is alive.
/// Dropping it reports the close.
#[derive(Debug)]
pub struct ConnectionLease {
    id: ConnectionId,
    lifecycle: Lifecycle,
}

impl ConnectionLease {
    pub fn open(lifecycle: &Lifecycle) -> Self {
        let id = lifecycle.tracker().allocate_id();
        lifecycle.connection_opened(id);
        Self {
            id,
            lifecycle: lifecycle.clone(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        self.lifecycle.connection_closed(self.id);
    }
}

/// Make-service for `axum::serve` that opens a lease per accepted connection.
#[derive(Clone)]
pub struct TrackConnections {
    router: Router,
    lifecycle: Lifecycle,
}

impl TrackConnections {
    pub fn new(router: Router, lifecycle: Lifecycle) -> Self {
        Self { router, lifecycle }
    }
}

impl<'a> Service<IncomingStream<'a>> for TrackConnections {
    type Response = TrackedRouter;
    type Error = Infallible;
    type Future = Ready<Result<TrackedRouter, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, stream: IncomingStream<'a>) -> Self::Future {
        let lease = ConnectionLease::open(&self.lifecycle);
        trace!(connection = %lease.id(), remote = %stream.remote_addr(), "Accepted connection");
        ready(Ok(TrackedRouter {
            router: self.router.clone(),
            _lease: Arc::new(lease),
        }))
    }
}

/// Per-connection service. The server clones it per request; the lease is
/// released once the connection task drops the last clone.
#[derive(Clone)]
pub struct TrackedRouter {
    router: Router,
    _lease: Arc<ConnectionLease>,
}

impl Service<Request> for TrackedRouter {
    type Response = Response;
    type Error = Infallible;
    type Future = RouteFuture<Infallible>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        <Router as Service<Request>>::poll_ready(&mut self.router, cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        <Router as Service<Request>>::call(&mut self.router, request)
    }
}
