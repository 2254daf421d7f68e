//! API module - HTTP routes, handlers and response envelopes

pub mod extract;
pub mod handlers;
pub mod response;
pub mod routes;

pub use response::ApiResponse;
pub use routes::create_router;
