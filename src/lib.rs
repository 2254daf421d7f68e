//! Generation Gateway
//!
//! An HTTP gateway in front of generation providers (Luma AI, Runware) with
//! error classification at the response boundary, a process guardian for
//! unrecoverable faults, and a poller that drives remote jobs to completion
//! inside a single request.

pub mod api;
pub mod config;
pub mod datastore;
pub mod error;
pub mod fault;
pub mod jobs;
pub mod lifecycle;
pub mod logging;
pub mod middleware;
pub mod provider;

pub use error::{AppError, Result};

use std::sync::Arc;

use config::Settings;
use fault::ErrorResponder;
use jobs::{JobPoller, PollConfig};
use lifecycle::ProcessGuardian;
use provider::ProviderRegistry;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<Settings>,
    pub providers: Arc<ProviderRegistry>,
    pub poller: JobPoller,
    pub guardian: Arc<ProcessGuardian>,
    pub responder: Arc<ErrorResponder>,
}

impl AppState {
    pub fn new(settings: Settings, guardian: Arc<ProcessGuardian>) -> Self {
        let responder = ErrorResponder::new(settings.mode, guardian.clone());
        Self::with_responder(settings, guardian, responder)
    }

    /// Build the state around a custom responder (alert sink, tests)
    pub fn with_responder(
        settings: Settings,
        guardian: Arc<ProcessGuardian>,
        responder: ErrorResponder,
    ) -> Self {
        Self {
            providers: Arc::new(ProviderRegistry::new(settings.providers.clone())),
            poller: JobPoller::new(PollConfig::from(&settings.polling)),
            settings: Arc::new(settings),
            guardian,
            responder: Arc::new(responder),
        }
    }
}
