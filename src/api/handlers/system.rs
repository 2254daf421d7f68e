//! Liveness routes and the not-found fallback

use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode, Uri},
    Extension,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::middleware::RequestTime;
use crate::AppState;

pub async fn root() -> ApiResponse {
    ApiResponse::success("Server is active!!")
}

pub async fn health(
    State(state): State<Arc<AppState>>,
    Extension(RequestTime(requested_at)): Extension<RequestTime>,
) -> ApiResponse {
    ApiResponse::success("healthy").with_data(json!({
        "state": state.guardian.state(),
        "mode": state.settings.mode,
        "requestTime": requested_at.to_rfc3339(),
    }))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("Unable to find {} on this server!!", target(&uri)))
}

/// A known path hit with a method it does not serve
pub async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::Rejected {
        status: StatusCode::METHOD_NOT_ALLOWED.as_u16(),
        message: format!("{} is not supported on {}!!", method, target(&uri)),
    }
}

fn target(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_else(|| uri.path())
}
