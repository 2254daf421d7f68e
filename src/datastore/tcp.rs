//! Datastore reachability over plain TCP

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Url;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::{Datastore, DatastoreError};
use crate::config::DatastoreConfig;

pub const DEFAULT_PORT: u16 = 27017;

/// Treats the datastore as reachable when its host accepts a TCP connection
pub struct TcpDatastore {
    connect_timeout: Duration,
    address: RwLock<Option<String>>,
}

impl TcpDatastore {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            address: RwLock::new(None),
        }
    }

    pub fn from_config(config: &DatastoreConfig) -> Self {
        Self::new(Duration::from_millis(config.connect_timeout_ms))
    }

    async fn open(&self, address: &str) -> Result<(), DatastoreError> {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(source)) => Err(DatastoreError::Unreachable {
                address: address.to_string(),
                source,
            }),
            Err(_) => Err(DatastoreError::Timeout {
                address: address.to_string(),
                after: self.connect_timeout,
            }),
        }
    }
}

/// `host:port` of a datastore URL such as `mongodb://user:pw@db:27017/app`
pub fn socket_address(url: &str) -> Result<String, DatastoreError> {
    let parsed = Url::parse(url).map_err(|e| DatastoreError::InvalidUrl(e.to_string()))?;
    let host = parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| DatastoreError::InvalidUrl(format!("{} has no host", url)))?;
    let port = parsed.port().unwrap_or(DEFAULT_PORT);
    Ok(format!("{}:{}", host, port))
}

#[async_trait]
impl Datastore for TcpDatastore {
    async fn connect(&self, url: &str) -> Result<(), DatastoreError> {
        let address = socket_address(url)?;
        self.open(&address).await?;
        info!(address = %address, "Connected to datastore");
        *self.address.write() = Some(address);
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatastoreError> {
        let address = self
            .address
            .read()
            .clone()
            .ok_or(DatastoreError::NotConnected)?;
        self.open(&address).await?;
        debug!(address = %address, "Datastore ping ok");
        Ok(())
    }
}
