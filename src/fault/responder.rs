//! Rendering classified errors into HTTP responses

use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::config::RunMode;
use crate::fault::taxonomy::{NormalizedError, RawFault};
use crate::lifecycle::{FaultEventKind, FaultReport, ProcessGuardian};

pub const GENERIC_MESSAGE: &str = "Something went wrong!!";

const FALLBACK_BODY: &str = r#"{"status":"Error","message":"Something went wrong!!"}"#;

/// Hook for errors that should wake somebody up
pub trait CriticalAlert: Send + Sync {
    fn notify(&self, err: &NormalizedError, raw: &RawFault);
}

/// Default alert sink: a structured log line flagged `critical`
pub struct LogAlert;

impl CriticalAlert for LogAlert {
    fn notify(&self, err: &NormalizedError, raw: &RawFault) {
        error!(
            critical = true,
            status_code = err.status_code(),
            name = raw.name.as_deref().unwrap_or("Error"),
            message = %err.message(),
            "Critical error"
        );
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a RawFault>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<&'a str>,
}

/// Turns a normalized error into the response the caller sees
pub struct ErrorResponder {
    mode: RunMode,
    alert: Arc<dyn CriticalAlert>,
    guardian: Arc<ProcessGuardian>,
}

impl ErrorResponder {
    pub fn new(mode: RunMode, guardian: Arc<ProcessGuardian>) -> Self {
        Self::with_alert(mode, guardian, Arc::new(LogAlert))
    }

    pub fn with_alert(
        mode: RunMode,
        guardian: Arc<ProcessGuardian>,
        alert: Arc<dyn CriticalAlert>,
    ) -> Self {
        Self {
            mode,
            alert,
            guardian,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Render `err`. Never panics; a rendering failure is handed to the
    /// guardian and the caller gets the generic 500.
    pub fn respond(&self, err: &NormalizedError, raw: &RawFault) -> Response {
        let (status_code, body) = match self.mode {
            RunMode::Development => (
                err.status_code(),
                ErrorBody {
                    status: err.status_class().label(),
                    message: err.message(),
                    error: Some(raw),
                    stack: Some(raw.stack.as_deref().unwrap_or("")),
                },
            ),
            RunMode::Production if err.is_operational() => (
                err.status_code(),
                ErrorBody {
                    status: err.status_class().label(),
                    message: err.message(),
                    error: None,
                    stack: None,
                },
            ),
            RunMode::Production => {
                error!(
                    status_code = err.status_code(),
                    name = raw.name.as_deref().unwrap_or("Error"),
                    message = %err.message(),
                    stack = raw.stack.as_deref().unwrap_or(""),
                    "Error:"
                );
                (
                    500,
                    ErrorBody {
                        status: "Error",
                        message: GENERIC_MESSAGE,
                        error: None,
                        stack: None,
                    },
                )
            }
        };

        if err.is_critical() {
            self.alert.notify(err, raw);
        }

        let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match serde_json::to_vec(&body) {
            Ok(bytes) => (status, [(CONTENT_TYPE, "application/json")], bytes).into_response(),
            Err(e) => {
                self.guardian.emit(
                    FaultEventKind::UncaughtException,
                    FaultReport::from_error("ResponseRenderError", &e),
                );
                fallback_response()
            }
        }
    }
}

fn fallback_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, "application/json")],
        FALLBACK_BODY,
    )
        .into_response()
}
