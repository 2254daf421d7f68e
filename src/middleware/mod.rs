//! Middleware module - Error boundary, drain guard and request stamping

pub mod drain;
pub mod error_boundary;
pub mod request_time;

pub use drain::DrainLayer;
pub use error_boundary::error_boundary;
pub use request_time::{stamp_request_time, RequestTime, REQUEST_TIME_HEADER};
