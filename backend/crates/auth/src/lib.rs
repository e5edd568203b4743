//! Auth (Authentication & Session Lifecycle) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, routers
//!
//! ## Features
//! - Registration with email confirmation codes (1-hour expiry)
//! - Login with login-or-email + password, JWT access tokens
//! - Refresh-token rotation bound to per-device sessions
//! - Password recovery codes with anti-enumeration on request
//! - Per-device session listing and termination
//! - Rate limiting on the public auth endpoints
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Refresh tokens carried in an httpOnly cookie, one per device session
//! - A session accepts exactly the last-issued refresh token (iat match)
//! - Invalid refresh tokens that still name a device revoke its session

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::{PgAuthRepository, PgRateLimitStore};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::{auth_router, security_router, testing_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAuthRepository as AuthStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
