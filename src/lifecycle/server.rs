//! Handle to the listening HTTP server

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Something that can stop accepting connections and drain
#[async_trait]
pub trait ListeningServer: Send + Sync {
    /// Stop accepting, wait for in-flight requests to finish
    async fn close(&self);
}

/// Shutdown handle for a server started with `axum::serve(..).with_graceful_shutdown(..)`
pub struct ServerHandle {
    shutdown: watch::Sender<bool>,
    closed: watch::Sender<bool>,
}

impl ServerHandle {
    pub fn new() -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        let (closed, _) = watch::channel(false);
        Arc::new(Self { shutdown, closed })
    }

    /// Resolves once shutdown was requested. Pass to `with_graceful_shutdown`.
    pub async fn shutdown_requested(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|requested| *requested).await;
    }

    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Called once `serve` has returned
    pub fn mark_closed(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl ListeningServer for ServerHandle {
    async fn close(&self) {
        self.request_shutdown();
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
