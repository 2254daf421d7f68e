//! Common error types for the generation gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::backtrace::Backtrace;
use thiserror::Error;

use crate::fault::RawFault;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// An extractor rejected the request before the handler ran
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A provider call failed; the message is already caller-safe
    #[error("{0}")]
    Provider(String),

    /// A provider client could not be constructed
    #[error("{0}")]
    ProviderUnavailable(String),

    /// The provider reported the job as failed
    #[error("Generation failed: {0}")]
    JobFailed(String),

    /// The provider could not be reached while polling
    #[error("Error checking generation status: {0}")]
    JobStatus(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Server is shutting down")]
    ShuttingDown,

    /// A fault reported by a collaborator in its own shape
    #[error("{}", .0.message.as_deref().unwrap_or("Upstream error"))]
    Upstream(RawFault),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error is raised with
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Config(_) | AppError::Io(_) | AppError::Json(_) => 500,
            AppError::HttpClient(_) => 502,
            AppError::InvalidRequest(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Rejected { status, .. } => *status,
            AppError::Provider(_) | AppError::ProviderUnavailable(_) | AppError::JobStatus(_) => 500,
            AppError::JobFailed(_) => 502,
            AppError::Timeout(_) => 504,
            AppError::Cancelled(_) => 499,
            AppError::ShuttingDown => 503,
            AppError::Upstream(raw) => raw.status_code.unwrap_or(500),
            AppError::Internal(_) => 500,
        }
    }

    /// Whether the message is safe to show to the caller
    pub fn is_operational(&self) -> bool {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Json(_)
            | AppError::HttpClient(_)
            | AppError::Internal(_) => false,
            AppError::Upstream(raw) => raw.is_operational.unwrap_or(false),
            _ => true,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AppError::Config(_) => "ConfigError",
            AppError::Io(_) => "IoError",
            AppError::Json(_) => "JsonError",
            AppError::HttpClient(_) => "HttpClientError",
            AppError::InvalidRequest(_) => "InvalidRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Rejected { .. } => "RequestRejected",
            AppError::Provider(_) => "ProviderError",
            AppError::ProviderUnavailable(_) => "ProviderUnavailable",
            AppError::JobFailed(_) => "JobFailed",
            AppError::JobStatus(_) => "JobStatusError",
            AppError::Timeout(_) => "Timeout",
            AppError::Cancelled(_) => "Cancelled",
            AppError::ShuttingDown => "ShuttingDown",
            AppError::Upstream(_) => "UpstreamError",
            AppError::Internal(_) => "InternalError",
        }
    }

    /// Raw fault handed to the error boundary
    pub fn to_raw_fault(&self) -> RawFault {
        if let AppError::Upstream(raw) = self {
            return raw.clone();
        }

        let mut raw = RawFault::new(self.name(), self.to_string())
            .with_status(self.status_code())
            .with_operational(self.is_operational());
        if !self.is_operational() {
            raw = raw.with_stack(Backtrace::capture().to_string());
        }
        raw
    }
}

impl IntoResponse for AppError {
    /// Carries the raw fault as a response extension; the error boundary
    /// classifies it and writes the body.
    fn into_response(self) -> Response {
        let raw = self.to_raw_fault();
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = status.into_response();
        response.extensions_mut().insert(raw);
        response
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
