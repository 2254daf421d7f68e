//! Stamps each request with the time it arrived

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, SecondsFormat, Utc};

pub const REQUEST_TIME_HEADER: HeaderName = HeaderName::from_static("x-request-time");

/// Arrival time, available to handlers as an extension
#[derive(Debug, Clone, Copy)]
pub struct RequestTime(pub DateTime<Utc>);

pub async fn stamp_request_time(mut request: Request, next: Next) -> Response {
    let now = Utc::now();
    request.extensions_mut().insert(RequestTime(now));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&now.to_rfc3339_opts(SecondsFormat::Millis, true)) {
        response
            .headers_mut()
            .insert(REQUEST_TIME_HEADER, value);
    }
    response
}
