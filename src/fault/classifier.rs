//! Raw fault classification
//!
//! Detection walks the known fault shapes in a fixed order. The checks are
//! independent: a later match overwrites an earlier one, so a raw fault that
//! carries both a validation sub-error and a duplicate-key code ends up as a
//! duplicate-key error.

use super::taxonomy::{display_value, NormalizedError, RawFault};

const DUPLICATE_KEY_CODE: i64 = 11000;
const INVALID_TOKEN_MESSAGE: &str = "Invalid Auth Token!! Please Login Again.";
const EXPIRED_TOKEN_MESSAGE: &str = "Auth Token Expried!! Please Login Again.";

/// Recognized fault shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// A value could not be cast to the field's type
    Cast { path: String, value: String },
    /// A field validator rejected the value
    Validation { message: String },
    /// Unique index violation
    DuplicateKey { field: String, value: String },
    /// Token signature or format was rejected
    InvalidToken,
    /// Token is past its expiry
    ExpiredToken,
    /// None of the above
    Unrecognized,
}

impl FaultKind {
    /// Detect the winning fault kind for a raw fault
    pub fn detect(raw: &RawFault) -> Self {
        let mut kind = FaultKind::Unrecognized;

        if let Some(first) = raw.first_sub_error() {
            match first.name.as_deref() {
                Some("CastError") => {
                    let path = first.path.or_else(|| raw.path.clone()).unwrap_or_default();
                    let value = first
                        .value
                        .as_ref()
                        .or(raw.value.as_ref())
                        .map(display_value)
                        .unwrap_or_default();
                    kind = FaultKind::Cast { path, value };
                }
                Some("ValidatorError") => {
                    kind = FaultKind::Validation {
                        message: first.message.unwrap_or_default(),
                    };
                }
                _ => {}
            }
        }

        if let Some(response) = &raw.error_response {
            if response.code == Some(DUPLICATE_KEY_CODE) {
                let (field, value) = response
                    .key_value
                    .as_ref()
                    .and_then(|kv| kv.iter().next())
                    .map(|(field, value)| (field.clone(), display_value(value)))
                    .unwrap_or_default();
                kind = FaultKind::DuplicateKey { field, value };
            }
        }

        match raw.name.as_deref() {
            Some("JsonWebTokenError") => kind = FaultKind::InvalidToken,
            Some("TokenExpiredError") => kind = FaultKind::ExpiredToken,
            _ => {}
        }

        kind
    }
}

/// Classify a raw fault. Pure.
pub fn classify(raw: &RawFault) -> NormalizedError {
    match FaultKind::detect(raw) {
        FaultKind::Cast { path, value } => {
            NormalizedError::operational(format!("Invalid {}: {}!!", path, value), 400)
        }
        FaultKind::Validation { message } => NormalizedError::operational(message, 400),
        FaultKind::DuplicateKey { field, value } => NormalizedError::operational(
            format!("Duplicate field value: '{}' with value: '{}'", field, value),
            400,
        ),
        FaultKind::InvalidToken => NormalizedError::operational(INVALID_TOKEN_MESSAGE, 401),
        FaultKind::ExpiredToken => NormalizedError::operational(EXPIRED_TOKEN_MESSAGE, 401),
        FaultKind::Unrecognized => {
            let status_code = raw
                .status_code
                .filter(|code| (400..=599).contains(code))
                .unwrap_or(500);
            NormalizedError::new(
                raw.message.clone().unwrap_or_else(|| "Unknown error".to_string()),
                status_code,
                raw.is_operational.unwrap_or(false),
            )
        }
    }
}
