//! Access/Refresh Token Codec
//!
//! HS256-signed JWTs carrying the claims the session layer trusts.
//! Access tokens identify a user; refresh tokens additionally carry the
//! device id and the `iat` that is cross-checked against the persisted
//! device session.
//!
//! Verification failures still surface the best-effort unsigned decode:
//! an expired or forged refresh token must be able to name its device so
//! the caller can revoke the associated session.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claims embedded in an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject -- the user id.
    pub sub: Uuid,
    /// Token type discriminator ("access").
    pub typ: String,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
}

/// Claims embedded in a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject -- the user id.
    pub sub: Uuid,
    /// Device session this token is bound to.
    #[serde(rename = "deviceId")]
    pub device_id: Uuid,
    /// Token type discriminator ("refresh").
    pub typ: String,
    /// Issued-at (Unix seconds). Must equal the session's stored `iat`.
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
}

const TYP_ACCESS: &str = "access";
const TYP_REFRESH: &str = "refresh";

/// Token verification/signing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token expired
    #[error("Token has expired")]
    Expired,

    /// Signature check failed
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Access token presented where a refresh token was expected (or vice versa)
    #[error("Wrong token type")]
    WrongTokenType,

    /// Not a decodable token at all
    #[error("Malformed token")]
    Malformed,
}

/// Outcome of refresh-token verification.
///
/// `Invalid` keeps whatever claims an unsigned decode could recover, so
/// the session bound to a dead token can still be cleaned up.
#[derive(Debug, Clone)]
pub enum Verification {
    Valid(RefreshClaims),
    Invalid {
        reason: TokenError,
        claims: Option<RefreshClaims>,
    },
}

/// Signs and verifies access/refresh tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue a short-lived access token for a user.
    pub fn issue_access(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user_id,
            typ: TYP_ACCESS.to_string(),
            iat: now,
            exp: now + self.access_ttl.as_secs() as i64,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Malformed)
    }

    /// Issue a refresh token bound to a device session.
    ///
    /// The stamped `iat` becomes the session's trust anchor; the caller
    /// decodes it back out with [`Self::decode_refresh_unverified`].
    pub fn issue_refresh(&self, user_id: Uuid, device_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id,
            device_id,
            typ: TYP_REFRESH.to_string(),
            iat: now,
            exp: now + self.refresh_ttl.as_secs() as i64,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Malformed)
    }

    /// Verify an access token (signature + expiry + type).
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = decode::<AccessClaims>(token, &self.decoding, &strict_validation())
            .map_err(map_jwt_error)?
            .claims;

        if claims.typ != TYP_ACCESS {
            return Err(TokenError::WrongTokenType);
        }

        Ok(claims)
    }

    /// Verify a refresh token (signature + expiry + type).
    ///
    /// On failure the best-effort unsigned decode rides along so the
    /// caller can still find the device session to revoke.
    pub fn verify_refresh(&self, token: &str) -> Verification {
        match decode::<RefreshClaims>(token, &self.decoding, &strict_validation()) {
            Ok(data) if data.claims.typ == TYP_REFRESH => Verification::Valid(data.claims),
            Ok(_) => Verification::Invalid {
                reason: TokenError::WrongTokenType,
                claims: self.decode_refresh_unverified(token),
            },
            Err(e) => Verification::Invalid {
                reason: map_jwt_error(e),
                claims: self.decode_refresh_unverified(token),
            },
        }
    }

    /// Decode refresh claims without any verification.
    ///
    /// Only for paths where trust was already established, or where the
    /// token is known-bad and the claims are needed for cleanup.
    pub fn decode_refresh_unverified(&self, token: &str) -> Option<RefreshClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<RefreshClaims>(token, &self.decoding, &validation)
            .ok()
            .map(|data| data.claims)
    }
}

/// Exact-expiry validation: the default 60 s leeway would let freshly
/// expired tokens pass.
fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(
            b"test-secret-that-is-long-enough-for-hmac",
            Duration::from_secs(600),
            Duration::from_secs(1200),
        )
    }

    #[test]
    fn test_access_token_roundtrip() {
        let codec = codec();
        let user_id = Uuid::new_v4();

        let token = codec.issue_access(user_id).unwrap();
        let claims = codec.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();

        let token = codec.issue_refresh(user_id, device_id).unwrap();
        match codec.verify_refresh(&token) {
            Verification::Valid(claims) => {
                assert_eq!(claims.sub, user_id);
                assert_eq!(claims.device_id, device_id);
                assert_eq!(claims.exp - claims.iat, 1200);
            }
            Verification::Invalid { reason, .. } => panic!("expected valid token, got {reason}"),
        }
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let codec = codec();
        let token = codec.issue_access(Uuid::new_v4()).unwrap();

        match codec.verify_refresh(&token) {
            Verification::Invalid { reason, .. } => {
                // An access token has no deviceId claim, so it fails to
                // decode as refresh claims before the type check fires.
                assert!(matches!(
                    reason,
                    TokenError::Malformed | TokenError::WrongTokenType
                ));
            }
            Verification::Valid(_) => panic!("access token must not verify as refresh"),
        }
    }

    #[test]
    fn test_expired_refresh_still_names_its_device() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();

        // Hand-roll an already-expired token with the codec's secret.
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id,
            device_id,
            typ: TYP_REFRESH.to_string(),
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-that-is-long-enough-for-hmac"),
        )
        .unwrap();

        match codec.verify_refresh(&token) {
            Verification::Invalid { reason, claims } => {
                assert_eq!(reason, TokenError::Expired);
                let claims = claims.expect("claims must be recoverable from expired token");
                assert_eq!(claims.device_id, device_id);
            }
            Verification::Valid(_) => panic!("expired token must not verify"),
        }
    }

    #[test]
    fn test_forged_signature_still_names_its_device() {
        let other = TokenCodec::new(
            b"a-completely-different-secret-key-here",
            Duration::from_secs(600),
            Duration::from_secs(1200),
        );
        let device_id = Uuid::new_v4();
        let token = other.issue_refresh(Uuid::new_v4(), device_id).unwrap();

        match codec().verify_refresh(&token) {
            Verification::Invalid { reason, claims } => {
                assert_eq!(reason, TokenError::InvalidSignature);
                assert_eq!(claims.unwrap().device_id, device_id);
            }
            Verification::Valid(_) => panic!("forged token must not verify"),
        }
    }

    #[test]
    fn test_garbage_token() {
        let codec = codec();

        match codec.verify_refresh("not.a.token") {
            Verification::Invalid { reason, claims } => {
                assert_eq!(reason, TokenError::Malformed);
                assert!(claims.is_none());
            }
            Verification::Valid(_) => panic!("garbage must not verify"),
        }

        assert!(codec.verify_access("garbage").is_err());
        assert!(codec.decode_refresh_unverified("garbage").is_none());
    }
}
