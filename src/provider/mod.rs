//! Provider module - Clients for the external generation providers

pub mod luma;
pub mod registry;
pub mod runware;
pub mod slot;
pub mod traits;

pub use luma::{ImageGeneration, LumaAssets, LumaClient, LumaRequest, VideoGeneration};
pub use registry::ProviderRegistry;
pub use runware::RunwareClient;
pub use slot::ProviderSlot;
pub use traits::{JobProvider, TaskProvider};

use thiserror::Error;

/// Errors raised by provider clients
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{key} is not configured")]
    NotConfigured { key: &'static str },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}
