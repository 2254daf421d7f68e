//! Rejects new requests once the process guardian is draining

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::debug;

use crate::error::AppError;
use crate::lifecycle::ProcessGuardian;

/// Drain guard layer
#[derive(Clone)]
pub struct DrainLayer {
    guardian: Arc<ProcessGuardian>,
}

impl DrainLayer {
    pub fn new(guardian: Arc<ProcessGuardian>) -> Self {
        Self { guardian }
    }
}

impl<S> Layer<S> for DrainLayer {
    type Service = DrainMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DrainMiddleware {
            inner,
            guardian: self.guardian.clone(),
        }
    }
}

/// Drain guard service
#[derive(Clone)]
pub struct DrainMiddleware<S> {
    inner: S,
    guardian: Arc<ProcessGuardian>,
}

impl<S> Service<Request<Body>> for DrainMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        if self.guardian.is_running() {
            let future = self.inner.call(request);
            return Box::pin(future);
        }

        debug!(path = %request.uri().path(), "Rejecting request while draining");
        Box::pin(async move { Ok(AppError::ShuttingDown.into_response()) })
    }
}
