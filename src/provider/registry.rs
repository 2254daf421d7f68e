//! Provider registry owning the lazily constructed clients

use std::sync::Arc;
use tracing::{info, warn};

use super::luma::{self, LumaClient};
use super::runware::{self, RunwareClient};
use super::slot::ProviderSlot;
use crate::config::ProvidersConfig;
use crate::error::{AppError, Result};

pub struct ProviderRegistry {
    config: ProvidersConfig,
    luma: ProviderSlot<LumaClient>,
    runware: ProviderSlot<RunwareClient>,
}

impl ProviderRegistry {
    pub fn new(config: ProvidersConfig) -> Self {
        Self {
            config,
            luma: ProviderSlot::new(),
            runware: ProviderSlot::new(),
        }
    }

    /// Log which provider keys are missing. Requests to those providers
    /// fail until the key is set.
    pub fn warn_missing_keys(&self) {
        for (var, provider) in [
            (luma::API_KEY_VAR, &self.config.luma),
            (runware::API_KEY_VAR, &self.config.runware),
        ] {
            match provider.api_key.as_deref() {
                Some(key) if !key.is_empty() => {
                    info!(key = var, "API key exists (not showing for security)")
                }
                _ => warn!(key = var, "API key is missing"),
            }
        }
    }

    pub async fn luma(&self) -> Result<Arc<LumaClient>> {
        self.luma
            .get_or_try_init(|| async { LumaClient::new(&self.config.luma) })
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to initialize Luma AI client");
                AppError::ProviderUnavailable(format!(
                    "{} initialization error: {}",
                    luma::PROVIDER_NAME,
                    e
                ))
            })
    }

    pub async fn runware(&self) -> Result<Arc<RunwareClient>> {
        self.runware
            .get_or_try_init(|| RunwareClient::connect(&self.config.runware))
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to initialize Runware client");
                AppError::ProviderUnavailable(format!(
                    "{} initialization error: {}",
                    runware::PROVIDER_NAME,
                    e
                ))
            })
    }

    /// Drop the Runware client. Returns whether one was connected.
    pub fn disconnect_runware(&self) -> bool {
        let disconnected = self.runware.reset().is_some();
        if disconnected {
            info!("Runware client disconnected");
        }
        disconnected
    }
}
