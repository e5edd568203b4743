//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, Base64, constant-time compare)
//! - Password hashing (Argon2id)
//! - Access/refresh token signing and verification (HS256)
//! - Cookie management
//! - Rate limiting infrastructure
//! - Client identification (IP, device title)

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
pub mod token;
