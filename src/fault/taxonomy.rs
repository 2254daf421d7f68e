//! Failure classification data model
//!
//! A [`RawFault`] is whatever a failing layer hands us: an `AppError`, a
//! datastore driver error, a token verifier error. A [`NormalizedError`] is
//! what the boundary renders. The two are kept apart so that classification
//! happens in exactly one place.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status class derived from the HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusClass {
    /// 4xx: the caller did something wrong
    ClientFailure,
    /// anything else
    ServerError,
}

impl StatusClass {
    pub fn from_status(status_code: u16) -> Self {
        if status_code / 100 == 4 {
            Self::ClientFailure
        } else {
            Self::ServerError
        }
    }

    /// Label used in the `status` field of error bodies
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClientFailure => "Failure",
            Self::ServerError => "Error",
        }
    }
}

/// A classified failure. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    message: String,
    status_code: u16,
    is_operational: bool,
}

impl NormalizedError {
    pub fn new(message: impl Into<String>, status_code: u16, is_operational: bool) -> Self {
        Self {
            message: message.into(),
            status_code,
            is_operational,
        }
    }

    /// A user-facing failure whose message may be shown verbatim
    pub fn operational(message: impl Into<String>, status_code: u16) -> Self {
        Self::new(message, status_code, true)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::from_status(self.status_code)
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    pub fn is_critical(&self) -> bool {
        self.status_code >= 500
    }
}

impl Serialize for NormalizedError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("NormalizedError", 4)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("statusCode", &self.status_code)?;
        state.serialize_field("status", self.status_class().label())?;
        state.serialize_field("isOperational", &self.is_operational)?;
        state.end()
    }
}

/// Unclassified fault as reported by any layer.
///
/// Every field is optional and checked on its own; no combination is assumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFault {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_operational: Option<bool>,
    /// Keyed sub-errors in insertion order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_response: Option<ErrorResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip)]
    pub stack: Option<String>,
}

/// Driver-level error payload (duplicate key errors live here)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_value: Option<Map<String, Value>>,
}

/// One entry of [`RawFault::errors`]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubError {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl RawFault {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_operational(mut self, is_operational: bool) -> Self {
        self.is_operational = Some(is_operational);
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// First keyed sub-error, if the map has one that parses
    pub fn first_sub_error(&self) -> Option<SubError> {
        let (_, first) = self.errors.as_ref()?.iter().next()?;
        serde_json::from_value(first.clone()).ok()
    }
}

/// Render a JSON value the way it reads in a message: strings unquoted
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
