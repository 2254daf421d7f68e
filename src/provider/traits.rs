//! Common traits for generation providers

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::ProviderError;
use crate::jobs::JobHandle;

/// A provider that runs generations as remote jobs which must be polled
#[async_trait]
pub trait JobProvider: Send + Sync {
    /// What a submission looks like
    type Request: Send + 'static;

    /// What a completed job yields
    type Output: Send + 'static;

    /// Display name used in error messages
    fn name(&self) -> &str;

    /// Start a job
    async fn submit(&self, request: Self::Request) -> Result<JobHandle<Self::Output>, ProviderError>;

    /// Look up the current state of a job
    async fn fetch_status(&self, id: &str) -> Result<JobHandle<Self::Output>, ProviderError>;
}

/// A provider whose operations complete within a single call
#[async_trait]
pub trait TaskProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Run one task and return the result entries it produced
    async fn run_task(
        &self,
        task_type: &str,
        params: Map<String, Value>,
    ) -> Result<Vec<Value>, ProviderError>;
}
