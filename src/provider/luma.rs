//! Luma AI Dream Machine client

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::traits::JobProvider;
use super::ProviderError;
use crate::config::ProviderConfig;
use crate::jobs::JobHandle;

pub const PROVIDER_NAME: &str = "Luma AI";
pub const API_KEY_VAR: &str = "LUMAAI_API_KEY";

pub const DEFAULT_IMAGE_MODEL: &str = "photon-flash-1";
pub const DEFAULT_VIDEO_MODEL: &str = "ray-2";
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Image generation parameters
#[derive(Debug, Clone, Serialize)]
pub struct ImageGeneration {
    pub prompt: String,
    pub model: String,
    pub aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_ref: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<Value>,
}

/// Video generation parameters
#[derive(Debug, Clone, Serialize)]
pub struct VideoGeneration {
    pub prompt: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub looped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// A generation request
#[derive(Debug, Clone)]
pub enum LumaRequest {
    Image(ImageGeneration),
    Video(VideoGeneration),
}

/// Output locations of a completed generation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LumaAssets {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    id: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(default)]
    assets: Option<LumaAssets>,
}

impl Generation {
    fn into_handle(self) -> JobHandle<LumaAssets> {
        match self.state.as_deref() {
            Some("completed") => JobHandle::completed(self.id, self.assets.unwrap_or_default()),
            Some("failed") => JobHandle::failed(
                self.id,
                self.failure_reason
                    .unwrap_or_else(|| "no reason given".to_string()),
            ),
            _ => JobHandle::pending(self.id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Luma AI REST client
pub struct LumaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LumaClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::NotConfigured { key: API_KEY_VAR })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn decode(response: Response) -> Result<Generation, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json::<Generation>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            detail: Some(Value::String(detail)),
            ..
        }) => detail,
        Ok(ApiErrorBody {
            detail: Some(detail),
            ..
        }) => detail.to_string(),
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => body.to_string(),
    }
}

#[async_trait]
impl JobProvider for LumaClient {
    type Request = LumaRequest;
    type Output = LumaAssets;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn submit(&self, request: LumaRequest) -> Result<JobHandle<LumaAssets>, ProviderError> {
        let builder = match &request {
            LumaRequest::Image(image) => self
                .client
                .post(format!("{}/generations/image", self.base_url))
                .json(image),
            LumaRequest::Video(video) => self
                .client
                .post(format!("{}/generations", self.base_url))
                .json(video),
        };

        let response = builder.bearer_auth(&self.api_key).send().await?;
        let generation = Self::decode(response).await?;
        debug!(generation_id = %generation.id, "Luma generation created");
        Ok(generation.into_handle())
    }

    async fn fetch_status(&self, id: &str) -> Result<JobHandle<LumaAssets>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/generations/{}", self.base_url, id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Ok(Self::decode(response).await?.into_handle())
    }
}
