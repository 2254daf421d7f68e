//! Request body extraction and presence checks

use axum::extract::{rejection::JsonRejection, FromRequest};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::fault::taxonomy::display_value;

/// `Json` whose rejections go through the error boundary
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status().as_u16(),
            message: rejection.body_text(),
        }
    }
}

/// Whether a body value counts as supplied. Missing, `null`, `""`, `0`
/// and `false` do not.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map_or(true, |n| n != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Top-level fields of a JSON request body
#[derive(Debug, Clone, Default)]
pub struct Fields(Map<String, Value>);

impl From<Value> for Fields {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

impl Fields {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The field if it is present in the sense of [`is_present`]
    pub fn present(&self, field: &str) -> Option<&Value> {
        let value = self.0.get(field);
        is_present(value).then_some(value).flatten()
    }

    pub fn require(&self, field: &str, message: &str) -> Result<&Value> {
        self.present(field)
            .ok_or_else(|| AppError::InvalidRequest(message.to_string()))
    }

    /// Required field rendered as text
    pub fn require_text(&self, field: &str, message: &str) -> Result<String> {
        self.require(field, message).map(display_value)
    }

    /// Optional field rendered as text
    pub fn text(&self, field: &str) -> Option<String> {
        self.present(field).map(display_value)
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Copy `fields` that were sent with a non-null value
    pub fn pick(&self, fields: &[&str], into: &mut Map<String, Value>) {
        for field in fields {
            match self.0.get(*field) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    into.insert(field.to_string(), value.clone());
                }
            }
        }
    }
}
