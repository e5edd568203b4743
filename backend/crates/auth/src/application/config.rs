//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::rate_limit::RateLimitConfig;
use platform::token::TokenCodec;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret for access/refresh tokens
    pub token_secret: Vec<u8>,
    /// Access token TTL (10 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token TTL (20 minutes)
    pub refresh_token_ttl: Duration,
    /// Confirmation/recovery code TTL (1 hour)
    pub code_ttl: Duration,
    /// Refresh-token carrier cookie settings
    pub cookie: CookieConfig,
    /// Rate limit for public auth endpoints (5 per 10 minutes)
    pub rate_limit: RateLimitConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(10 * 60),
            refresh_token_ttl: Duration::from_secs(20 * 60),
            code_ttl: Duration::from_secs(3600),
            cookie: CookieConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Create config with a random token secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            token_secret: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        let mut config = Self::with_random_secret();
        config.cookie.secure = false;
        config
    }

    /// Build the token codec from this configuration
    pub fn token_codec(&self) -> TokenCodec {
        TokenCodec::new(
            &self.token_secret,
            self.access_token_ttl,
            self.refresh_token_ttl,
        )
    }

    /// Code TTL as a chrono duration for entity expirations
    pub fn code_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.code_ttl).unwrap_or_else(|_| chrono::Duration::hours(1))
    }
}
