//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub datastore: DatastoreConfig,
    #[serde(default)]
    pub guardian: GuardianSettings,
}

/// How much detail error responses carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            _ => Self::Production,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Mount the `/test/trigger-*` routes
    #[serde(default)]
    pub enable_fault_triggers: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5002
}

fn default_body_limit() -> usize {
    10 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            enable_fault_triggers: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Provider credentials and endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_luma")]
    pub luma: ProviderConfig,
    #[serde(default = "default_runware")]
    pub runware: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            luma: default_luma(),
            runware: default_runware(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Empty when unset; filled with the provider's endpoint on load
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

const LUMA_BASE_URL: &str = "https://api.lumalabs.ai/dream-machine/v1";
const RUNWARE_BASE_URL: &str = "https://api.runware.ai/v1";

fn default_luma() -> ProviderConfig {
    ProviderConfig {
        api_key: None,
        base_url: LUMA_BASE_URL.to_string(),
        timeout_ms: default_timeout(),
    }
}

fn default_runware() -> ProviderConfig {
    ProviderConfig {
        api_key: None,
        base_url: RUNWARE_BASE_URL.to_string(),
        timeout_ms: default_timeout(),
    }
}

impl ProvidersConfig {
    /// A partially configured provider table keeps the stock endpoint
    fn fill_default_urls(&mut self) {
        for (provider, fallback) in [
            (&mut self.luma, LUMA_BASE_URL),
            (&mut self.runware, RUNWARE_BASE_URL),
        ] {
            if provider.base_url.trim().is_empty() {
                provider.base_url = fallback.to_string();
            }
        }
    }
}

fn default_timeout() -> u64 {
    60000
}

/// Job polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    /// Upper bound on status fetches per job; `None` disables the bound
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,
    /// Wall-clock bound per job; `None` disables the bound
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: Option<u64>,
}

fn default_poll_interval() -> u64 {
    3000
}

fn default_max_attempts() -> Option<u32> {
    Some(200)
}

fn default_poll_timeout() -> Option<u64> {
    Some(900)
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_poll_timeout(),
        }
    }
}

/// Datastore connection and liveness probing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatastoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_probe_interval() -> u64 {
    30
}

fn default_failure_threshold() -> u32 {
    3
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout_ms: default_connect_timeout(),
            probe_interval_secs: default_probe_interval(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

/// Process guardian configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuardianSettings {
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_ms: u64,
}

fn default_drain_timeout() -> u64 {
    10000
}

impl Default for GuardianSettings {
    fn default() -> Self {
        Self {
            drain_timeout_ms: default_drain_timeout(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from_path("config/default.toml")?;
        settings.apply_legacy_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// `env` replaces the process environment when given
    fn load_with_env<P: AsRef<Path>>(path: P, env: Option<Map<String, String>>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            // Override with environment variables (prefixed with GEN_GATEWAY__)
            .add_source(
                Environment::with_prefix("GEN_GATEWAY")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.providers.fill_default_urls();
        Ok(settings)
    }

    /// Apply the unprefixed variables older deployments set
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(mode) = lookup("NODE_ENV") {
            self.mode = RunMode::from_env_value(&mode);
        }
        if self.providers.luma.api_key.is_none() {
            self.providers.luma.api_key = lookup("LUMAAI_API_KEY");
        }
        if self.providers.runware.api_key.is_none() {
            self.providers.runware.api_key = lookup("RUNWARE_API_KEY");
        }
        if self.datastore.url.is_none() {
            self.datastore.url = lookup("DATABASE_URL");
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.polling.interval_ms == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Polling interval must be greater than 0".to_string(),
            )));
        }

        if self.datastore.failure_threshold == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Datastore failure threshold must be greater than 0".to_string(),
            )));
        }

        for (name, provider) in [
            ("luma", &self.providers.luma),
            ("runware", &self.providers.runware),
        ] {
            if provider.base_url.is_empty() {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "Provider '{}' must have a base URL",
                    name
                ))));
            }
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            providers: ProvidersConfig::default(),
            polling: PollingConfig::default(),
            datastore: DatastoreConfig::default(),
            guardian: GuardianSettings::default(),
        }
    }
}
