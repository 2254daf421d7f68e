//! API route definitions

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::extract::ApiJson;
use super::handlers::{luma, runware, system, triggers};
use crate::config::RunMode;
use crate::middleware::{error_boundary, stamp_request_time, DrainLayer};
use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let lumaai = Router::new()
        .route("/image", post(luma::generate_image))
        .route("/video", post(luma::generate_video));

    let mut runware_routes = Router::new().route("/disconnect", post(runware::disconnect));
    for operation in runware::RunwareOperation::ALL {
        runware_routes = runware_routes.route(
            &format!("/{}", operation.route()),
            post(
                move |state: State<Arc<AppState>>, body: ApiJson<Value>| {
                    runware::run_operation(operation, state, body)
                },
            ),
        );
    }

    let mut router = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api/v1/lumaai", lumaai)
        .nest("/api/v1/runware", runware_routes);

    if state.settings.server.enable_fault_triggers {
        router = router.nest(
            "/test",
            Router::new()
                .route("/trigger-uncaught", get(triggers::trigger_uncaught))
                .route("/trigger-unhandled", get(triggers::trigger_unhandled))
                .route(
                    "/trigger-datastore-error",
                    get(triggers::trigger_datastore_error),
                ),
        );
    }

    let mut router = router
        .method_not_allowed_fallback(system::method_not_allowed)
        .fallback(system::not_found)
        .layer(DefaultBodyLimit::max(state.settings.server.body_limit_bytes));

    if state.settings.mode == RunMode::Development {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
        .layer(DrainLayer::new(state.guardian.clone()))
        .layer(middleware::from_fn(stamp_request_time))
        .layer(middleware::from_fn_with_state(
            state.responder.clone(),
            error_boundary,
        ))
        .with_state(state)
}
