//! Routes that deliberately raise process faults. Mounted only when
//! `server.enable_fault_triggers` is set.

use axum::extract::State;
use std::sync::Arc;

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::fault::RawFault;
use crate::lifecycle::{FaultEventKind, FaultReport};
use crate::AppState;

pub async fn trigger_uncaught() -> ApiResponse {
    tokio::spawn(async {
        panic!("Manual uncaught exception");
    });
    ApiResponse::success("Triggered uncaught exception")
}

pub async fn trigger_unhandled(State(state): State<Arc<AppState>>) -> ApiResponse {
    state.guardian.spawn_supervised("trigger-unhandled", async {
        Err(AppError::Internal("Manual unhandled rejection".to_string()))
    });
    ApiResponse::success("Triggered unhandled rejection")
}

pub async fn trigger_datastore_error(State(state): State<Arc<AppState>>) -> ApiResponse {
    let raw = RawFault::new("DatastoreServerError", "Manual datastore error").with_status(500);
    state
        .guardian
        .emit(FaultEventKind::DatastoreFatalError, FaultReport::from_raw(&raw));
    ApiResponse::success("Triggered datastore error")
}
