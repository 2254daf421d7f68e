//! Drives a remote job to a terminal state
//!
//! The poller owns one [`JobHandle`] for the duration of one request. It waits
//! a fixed interval between status checks and gives up on an attempt bound,
//! an overall deadline, or a cancellation signal, whichever comes first.
//! Dropping the future returned by [`JobPoller::track`] stops polling as well.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use super::cancel::Cancellation;
use super::handle::{JobHandle, JobState};
use crate::config::PollingConfig;
use crate::error::AppError;

/// Poll loop configuration
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed wait between status checks
    pub interval: Duration,
    /// Maximum number of status checks after submit
    pub max_attempts: Option<u32>,
    /// Overall deadline, measured from before submit
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts,
            timeout: config.timeout(),
        }
    }
}

/// Why tracking a job did not produce a result
#[derive(Debug, Error)]
pub enum PollError {
    /// The job could not be started
    #[error("failed to start job: {0}")]
    Submit(String),

    /// The provider could not be asked about the job
    #[error("failed to fetch status of job {id}: {message}")]
    Status { id: String, message: String },

    /// The provider says the job failed
    #[error("job {id} failed: {reason}")]
    Failed { id: String, reason: String },

    #[error("job {} did not finish after {attempts} status checks ({elapsed:?})", .id.as_deref().unwrap_or("<unsubmitted>"))]
    Timeout {
        id: Option<String>,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("job {} was cancelled", .id.as_deref().unwrap_or("<unsubmitted>"))]
    Cancelled { id: Option<String> },
}

impl PollError {
    /// Map onto the HTTP-facing error for a given provider
    pub fn into_app_error(self, provider: &str) -> AppError {
        match self {
            PollError::Submit(message) => {
                AppError::Provider(format!("Failed to connect to {}: {}", provider, message))
            }
            PollError::Status { message, .. } => AppError::JobStatus(message),
            PollError::Failed { reason, .. } => AppError::JobFailed(reason),
            PollError::Timeout {
                attempts, elapsed, ..
            } => AppError::Timeout(format!(
                "{} job did not finish after {} status checks in {}s",
                provider,
                attempts,
                elapsed.as_secs()
            )),
            PollError::Cancelled { .. } => {
                AppError::Cancelled(format!("{} job was abandoned", provider))
            }
        }
    }
}

/// Job poller. Stateless apart from its configuration.
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Submit a job and poll it until it completes, fails or gives up
    pub async fn track<T, E, S, F, Fut>(
        &self,
        submit: S,
        mut fetch_status: F,
        cancel: &mut Cancellation,
    ) -> Result<T, PollError>
    where
        S: Future<Output = Result<JobHandle<T>, E>>,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<JobHandle<T>, E>>,
        E: fmt::Display,
    {
        let started = Instant::now();
        let deadline = self.config.timeout.map(|timeout| started + timeout);

        let mut handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled { id: None }),
            _ = wait_until(deadline) => {
                return Err(PollError::Timeout { id: None, attempts: 0, elapsed: started.elapsed() })
            }
            submitted = submit => submitted.map_err(|e| PollError::Submit(e.to_string()))?,
        };
        debug!(job_id = %handle.id, "Job submitted");

        let mut attempts = 0u32;
        loop {
            let id = match handle.state {
                JobState::Completed(result) => {
                    debug!(job_id = %handle.id, attempts, "Job completed");
                    return Ok(result);
                }
                JobState::Failed(reason) => {
                    debug!(job_id = %handle.id, attempts, reason = %reason, "Job failed");
                    return Err(PollError::Failed {
                        id: handle.id,
                        reason,
                    });
                }
                JobState::Pending => handle.id,
            };

            if self.config.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(PollError::Timeout {
                    id: Some(id),
                    attempts,
                    elapsed: started.elapsed(),
                });
            }

            debug!(job_id = %id, attempt = attempts + 1, "Job pending");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled { id: Some(id) }),
                _ = wait_until(deadline) => {
                    return Err(PollError::Timeout { id: Some(id), attempts, elapsed: started.elapsed() })
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            attempts += 1;
            handle = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled { id: Some(id) }),
                _ = wait_until(deadline) => {
                    return Err(PollError::Timeout { id: Some(id), attempts, elapsed: started.elapsed() })
                }
                fetched = fetch_status(id.clone()) => fetched.map_err(|e| PollError::Status {
                    id: id.clone(),
                    message: e.to_string(),
                })?,
            };
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
