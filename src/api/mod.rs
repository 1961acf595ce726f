//! # REST API Components
//!
//! HTTP routing, the rate gate, handlers and the response envelope.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod response;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use response::ApiResponse;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
