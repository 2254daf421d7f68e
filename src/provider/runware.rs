//! Runware client
//!
//! Every Runware operation is a task posted as a one-element array to the
//! API root. Results come back in a `{data, errors}` envelope.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::traits::TaskProvider;
use super::ProviderError;
use crate::config::ProviderConfig;

pub const PROVIDER_NAME: &str = "Runware";
pub const API_KEY_VAR: &str = "RUNWARE_API_KEY";

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    errors: Vec<TaskError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl TaskError {
    fn describe(&self) -> String {
        match (&self.message, &self.code) {
            (Some(message), _) => message.clone(),
            (None, Some(code)) => code.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

/// Runware REST client
pub struct RunwareClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RunwareClient {
    /// Build a client and check that Runware accepts the key
    pub async fn connect(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::NotConfigured { key: API_KEY_VAR })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let runware = Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        };
        runware.ping().await?;
        info!("Runware client connected");
        Ok(runware)
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        let mut params = Map::new();
        params.insert("ping".to_string(), Value::Bool(true));
        self.run_task("ping", params).await.map(|_| ())
    }
}

#[async_trait]
impl TaskProvider for RunwareClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn run_task(
        &self,
        task_type: &str,
        params: Map<String, Value>,
    ) -> Result<Vec<Value>, ProviderError> {
        let task_uuid = Uuid::new_v4().to_string();

        let mut task = Map::new();
        task.insert("taskType".to_string(), Value::String(task_type.to_string()));
        task.insert("taskUUID".to_string(), Value::String(task_uuid.clone()));
        task.extend(params);

        debug!(task_type, task_uuid = %task_uuid, "Sending Runware task");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&[Value::Object(task)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: body,
                })
            }
            Err(e) => return Err(ProviderError::Decode(e.to_string())),
        };

        if let Some(error) = envelope.errors.first() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error.describe(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(envelope.data)
    }
}
