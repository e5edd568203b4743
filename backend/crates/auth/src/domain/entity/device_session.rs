//! Device Session Entity
//!
//! One record per authenticated device, keyed by `device_id`. The stored
//! `iat` mirrors the refresh token currently trusted for the device and
//! is the sole test for stale or replayed refresh tokens.

use crate::domain::value_object::{DeviceId, UserId};

/// Device session entity
#[derive(Debug, Clone)]
pub struct DeviceSession {
    pub user_id: UserId,
    /// Opaque identifier minted at login
    pub device_id: DeviceId,
    /// Client IP at login / last rotation
    pub ip: Option<String>,
    /// Human-readable device title (from User-Agent)
    pub device_title: String,
    /// Issued-at of the currently trusted refresh token (Unix seconds)
    pub iat: i64,
    /// Expiry of the currently trusted refresh token (Unix seconds)
    pub exp: i64,
}

impl DeviceSession {
    /// Create a session bound to a freshly minted device id.
    pub fn new(
        user_id: UserId,
        device_id: DeviceId,
        ip: Option<String>,
        device_title: String,
        iat: i64,
        exp: i64,
    ) -> Self {
        Self {
            user_id,
            device_id,
            ip,
            device_title,
            iat,
            exp,
        }
    }

    /// Re-arm the session on refresh-token rotation.
    ///
    /// Advancing `iat` is what invalidates the previous refresh token.
    pub fn rearm(&mut self, iat: i64, exp: i64, ip: Option<String>) {
        self.iat = iat;
        self.exp = exp;
        self.ip = ip;
    }

    /// Whether a refresh token's `iat` claim matches the trusted one.
    pub fn token_matches(&self, iat: i64) -> bool {
        self.iat == iat
    }

    /// Whether the trusted refresh token has expired.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DeviceSession {
        DeviceSession::new(
            UserId::new(),
            DeviceId::new(),
            Some("10.0.0.1".to_string()),
            "Firefox on Linux".to_string(),
            1_000,
            2_200,
        )
    }

    #[test]
    fn test_token_matches_only_current_iat() {
        let session = session();
        assert!(session.token_matches(1_000));
        assert!(!session.token_matches(999));
        assert!(!session.token_matches(1_001));
    }

    #[test]
    fn test_rearm_advances_trust_anchor() {
        let mut session = session();
        session.rearm(1_500, 2_700, Some("10.0.0.2".to_string()));

        // The previous token's iat no longer matches
        assert!(!session.token_matches(1_000));
        assert!(session.token_matches(1_500));
        assert_eq!(session.exp, 2_700);
        assert_eq!(session.ip.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn test_is_expired() {
        let session = session();
        assert!(!session.is_expired(2_200));
        assert!(session.is_expired(2_201));
    }
}
