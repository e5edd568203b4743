//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod email;
pub mod memory;
pub mod postgres;

pub use email::HttpEmailGateway;
pub use memory::InMemoryAuthRepository;
pub use postgres::{PgAuthRepository, PgRateLimitStore};
