//! Unit tests for raw fault classification

use gen_fault_gateway::fault::{classify, FaultKind, RawFault, StatusClass};
use serde_json::json;

fn raw(value: serde_json::Value) -> RawFault {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_cast_error() {
    let fault = raw(json!({
        "errors": { "age": { "name": "CastError", "path": "age", "value": "abc" } }
    }));

    let err = classify(&fault);
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message(), "Invalid age: abc!!");
    assert!(err.is_operational());
    assert_eq!(err.status_class(), StatusClass::ClientFailure);
}

#[test]
fn test_cast_error_falls_back_to_top_level_path() {
    let fault = raw(json!({
        "errors": { "_id": { "name": "CastError" } },
        "path": "_id",
        "value": 42
    }));

    assert_eq!(classify(&fault).message(), "Invalid _id: 42!!");
}

#[test]
fn test_validator_error_uses_entry_message() {
    let fault = raw(json!({
        "errors": {
            "email": { "name": "ValidatorError", "message": "Email is required" },
            "name": { "name": "CastError", "path": "name", "value": 1 }
        }
    }));

    let err = classify(&fault);
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message(), "Email is required");
}

#[test]
fn test_duplicate_key() {
    let fault = raw(json!({
        "errorResponse": { "code": 11000, "keyValue": { "email": "a@b.c" } }
    }));

    let err = classify(&fault);
    assert_eq!(err.status_code(), 400);
    assert_eq!(
        err.message(),
        "Duplicate field value: 'email' with value: 'a@b.c'"
    );
    assert!(err.is_operational());
}

#[test]
fn test_invalid_token() {
    let err = classify(&RawFault::new("JsonWebTokenError", "jwt malformed"));
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.message(), "Invalid Auth Token!! Please Login Again.");
    assert!(err.is_operational());
}

#[test]
fn test_expired_token() {
    let err = classify(&RawFault::new("TokenExpiredError", "jwt expired"));
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.message(), "Auth Token Expried!! Please Login Again.");
}

#[test]
fn test_unrecognized_keeps_operational_fields() {
    let fault = RawFault::new("AppError", "Prompt is required")
        .with_status(400)
        .with_operational(true);

    let err = classify(&fault);
    assert_eq!(FaultKind::detect(&fault), FaultKind::Unrecognized);
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message(), "Prompt is required");
    assert!(err.is_operational());
}

#[test]
fn test_unrecognized_defaults() {
    let err = classify(&RawFault::default());
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.message(), "Unknown error");
    assert!(!err.is_operational());
    assert_eq!(err.status_class(), StatusClass::ServerError);
}

#[test]
fn test_invalid_status_becomes_500() {
    let err = classify(&RawFault::new("Error", "odd").with_status(200));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn test_later_check_wins() {
    let fault = raw(json!({
        "name": "TokenExpiredError",
        "errors": { "age": { "name": "CastError", "path": "age", "value": "x" } },
        "errorResponse": { "code": 11000, "keyValue": { "email": "a@b.c" } }
    }));

    assert_eq!(FaultKind::detect(&fault), FaultKind::ExpiredToken);
    assert_eq!(classify(&fault).status_code(), 401);
}

#[test]
fn test_duplicate_key_overrides_validation() {
    let fault = raw(json!({
        "errors": { "email": { "name": "ValidatorError", "message": "bad email" } },
        "errorResponse": { "code": 11000, "keyValue": { "email": "a@b.c" } }
    }));

    assert!(matches!(
        FaultKind::detect(&fault),
        FaultKind::DuplicateKey { .. }
    ));
}
