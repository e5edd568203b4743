//! Refresh Token Guard
//!
//! The single validation path every refresh-token flow goes through:
//! rotation, logout, device listing, and device termination.

use std::sync::Arc;

use platform::token::{RefreshClaims, TokenCodec, Verification};

use crate::domain::repository::{AccountRepository, DeviceSessionRepository};
use crate::domain::value_object::{DeviceId, UserId};
use crate::error::{AuthError, AuthResult};

/// Refresh token validation guard
pub struct RefreshTokenGuard<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenCodec>,
}

impl<R> RefreshTokenGuard<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenCodec>) -> Self {
        Self { repo, tokens }
    }

    /// Validate a refresh token against its device session.
    ///
    /// A token that fails verification but still names a device gets that
    /// session deleted before the Unauthorized is returned: a dead token
    /// must not leave a live session behind.
    pub async fn execute(&self, refresh_token: &str) -> AuthResult<RefreshClaims> {
        let claims = match self.tokens.verify_refresh(refresh_token) {
            Verification::Valid(claims) => claims,
            Verification::Invalid { reason, claims } => {
                if let Some(claims) = claims {
                    let device_id = DeviceId::from_uuid(claims.device_id);
                    if let Err(e) =
                        DeviceSessionRepository::delete(self.repo.as_ref(), &device_id).await
                    {
                        tracing::error!(
                            device_id = %device_id,
                            error = %e,
                            "Failed to revoke session of invalid refresh token"
                        );
                    } else {
                        tracing::warn!(
                            device_id = %device_id,
                            reason = %reason,
                            "Revoked session of invalid refresh token"
                        );
                    }
                }
                return Err(AuthError::Unauthorized);
            }
        };

        let user_id = UserId::from_uuid(claims.sub);
        if self.repo.find_by_id(&user_id).await?.is_none() {
            return Err(AuthError::Unauthorized);
        }

        let device_id = DeviceId::from_uuid(claims.device_id);
        let session = self
            .repo
            .find_by_device_id(&device_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        // iat equality is the sole stale/replayed-token test
        if !session.token_matches(claims.iat) {
            return Err(AuthError::Unauthorized);
        }

        Ok(claims)
    }
}
