//! Datastore module - Connection check and liveness monitoring

pub mod monitor;
pub mod tcp;

pub use monitor::DatastoreMonitor;
pub use tcp::TcpDatastore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the datastore
#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("invalid datastore URL: {0}")]
    InvalidUrl(String),

    #[error("failed to reach {address}: {source}")]
    Unreachable {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out reaching {address} after {after:?}")]
    Timeout { address: String, after: Duration },

    #[error("datastore is not connected")]
    NotConnected,
}

/// The datastore as far as process lifecycle is concerned
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Establish the connection; called once at startup
    async fn connect(&self, url: &str) -> Result<(), DatastoreError>;

    /// Check the connection is still usable
    async fn ping(&self) -> Result<(), DatastoreError>;
}
