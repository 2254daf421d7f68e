//! Datastore liveness monitor
//!
//! Runs after the server is listening. A run of failed pings at least
//! `failure_threshold` long is treated as fatal and handed to the guardian.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Datastore;
use crate::config::DatastoreConfig;
use crate::lifecycle::{FaultEventKind, FaultReport, ProcessGuardian};

pub struct DatastoreMonitor {
    datastore: Arc<dyn Datastore>,
    guardian: Arc<ProcessGuardian>,
    probe_task: RwLock<Option<JoinHandle<()>>>,
    interval: Duration,
    /// Number of consecutive failures before the datastore counts as lost
    failure_threshold: u32,
}

impl DatastoreMonitor {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        guardian: Arc<ProcessGuardian>,
        config: &DatastoreConfig,
    ) -> Self {
        Self {
            datastore,
            guardian,
            probe_task: RwLock::new(None),
            interval: Duration::from_secs(config.probe_interval_secs),
            failure_threshold: config.failure_threshold.max(1),
        }
    }

    /// Start the probe background task
    pub async fn start(&self) {
        let datastore = self.datastore.clone();
        let guardian = self.guardian.clone();
        let interval = self.interval;
        let failure_threshold = self.failure_threshold;

        let handle = tokio::spawn(async move {
            let mut consecutive_failures = 0u32;
            let mut cancel = guardian.cancellation();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                match datastore.ping().await {
                    Ok(()) => {
                        if consecutive_failures > 0 {
                            info!(
                                failures = consecutive_failures,
                                "Datastore reachable again"
                            );
                        }
                        consecutive_failures = 0;
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        warn!(
                            error = %e,
                            failures = consecutive_failures,
                            "Datastore ping failed"
                        );

                        if consecutive_failures >= failure_threshold {
                            guardian.emit(
                                FaultEventKind::DatastoreFatalError,
                                FaultReport::from_error("DatastoreError", &e),
                            );
                            break;
                        }
                    }
                }

                debug!(
                    consecutive_failures = consecutive_failures,
                    "Datastore probe completed"
                );
            }
        });

        *self.probe_task.write().await = Some(handle);
        info!(
            interval_secs = self.interval.as_secs(),
            "Started datastore monitor"
        );
    }

    /// Stop the probe background task
    pub async fn stop(&self) {
        if let Some(handle) = self.probe_task.write().await.take() {
            handle.abort();
            info!("Stopped datastore monitor");
        }
    }
}
