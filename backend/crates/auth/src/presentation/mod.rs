//! Presentation Layer
//!
//! HTTP handlers, DTOs, routers, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::rate_limit;
pub use router::{auth_router, security_router, testing_router};
