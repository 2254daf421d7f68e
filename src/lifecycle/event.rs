//! Process fault events

use serde::Serialize;
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

use super::server::ListeningServer;
use crate::fault::RawFault;

/// Kinds of unrecoverable faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultEventKind {
    UncaughtException,
    UnhandledRejection,
    DatastoreFatalError,
    DatastoreConnectError,
}

impl FaultEventKind {
    /// Headline printed to the operator log before the report
    pub fn operator_message(&self) -> &'static str {
        match self {
            Self::UncaughtException => "Something unexpected happened!!",
            Self::UnhandledRejection => "Something unexpected happened. Shutting down server!!",
            Self::DatastoreFatalError => "Unable to connect to database. Shutting down server!!",
            Self::DatastoreConnectError => "Unable to connect to database!!",
        }
    }
}

impl fmt::Display for FaultEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UncaughtException => "uncaughtException",
            Self::UnhandledRejection => "unhandledRejection",
            Self::DatastoreFatalError => "datastoreFatalError",
            Self::DatastoreConnectError => "datastoreConnectError",
        };
        f.write_str(label)
    }
}

/// What went wrong, in a shape that can always be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultReport {
    pub name: String,
    pub message: String,
    pub stack: String,
}

impl FaultReport {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: Backtrace::capture().to_string(),
        }
    }

    pub fn from_error<E: std::error::Error + ?Sized>(name: impl Into<String>, err: &E) -> Self {
        Self::new(name, err.to_string())
    }

    pub fn from_raw(raw: &RawFault) -> Self {
        Self {
            name: raw.name.clone().unwrap_or_else(|| "Error".to_string()),
            message: raw.message.clone().unwrap_or_default(),
            stack: raw
                .stack
                .clone()
                .unwrap_or_else(|| Backtrace::capture().to_string()),
        }
    }

    /// Build a report from a panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send), location: Option<String>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        let message = match location {
            Some(location) => format!("{} at {}", message, location),
            None => message,
        };

        Self {
            name: "Panic".to_string(),
            message,
            stack: Backtrace::force_capture().to_string(),
        }
    }
}

/// A fault the process cannot continue past
#[derive(Clone)]
pub struct ProcessFaultEvent {
    pub kind: FaultEventKind,
    pub report: FaultReport,
    /// Server to close before exiting, if one is listening
    pub server: Option<Arc<dyn ListeningServer>>,
}

impl ProcessFaultEvent {
    pub fn new(kind: FaultEventKind, report: FaultReport) -> Self {
        Self {
            kind,
            report,
            server: None,
        }
    }

    pub fn with_server(mut self, server: Arc<dyn ListeningServer>) -> Self {
        self.server = Some(server);
        self
    }
}

impl fmt::Debug for ProcessFaultEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessFaultEvent")
            .field("kind", &self.kind)
            .field("report", &self.report)
            .field("server", &self.server.is_some())
            .finish()
    }
}
