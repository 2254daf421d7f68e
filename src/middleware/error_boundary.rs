//! Outermost middleware: classifies failed responses and renders them

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::fault::{classify, ErrorResponder, RawFault};

/// Every `AppError` leaves a [`RawFault`] on its response. This is the single
/// place it gets classified and turned into a body.
pub async fn error_boundary(
    State(responder): State<Arc<ErrorResponder>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(raw) = response.extensions_mut().remove::<RawFault>() else {
        return response;
    };

    let normalized = classify(&raw);
    let mut rendered = responder.respond(&normalized, &raw);

    // Keep headers set by inner layers (request time and the like)
    for name in response.headers().keys() {
        if rendered.headers().contains_key(name) {
            continue;
        }
        for value in response.headers().get_all(name) {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}
