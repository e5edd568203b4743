//! Refresh Session Use Case
//!
//! Rotates an access/refresh pair and re-arms the backing device session.

use std::sync::Arc;

use platform::token::TokenCodec;

use crate::application::login::TokenPair;
use crate::application::refresh_guard::RefreshTokenGuard;
use crate::domain::repository::{AccountRepository, DeviceSessionRepository};
use crate::domain::value_object::DeviceId;
use crate::error::{AuthError, AuthResult};

/// Refresh session use case
pub struct RefreshSessionUseCase<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenCodec>,
    guard: RefreshTokenGuard<R>,
}

impl<R> RefreshSessionUseCase<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenCodec>) -> Self {
        let guard = RefreshTokenGuard::new(repo.clone(), tokens.clone());
        Self { repo, tokens, guard }
    }

    /// Exchange a valid refresh token for a new pair.
    ///
    /// The session keeps its device id; only iat, exp and the caller's
    /// current IP move forward. After this the old token's iat no longer
    /// matches and any replay of it is rejected.
    pub async fn execute(&self, refresh_token: &str, ip: Option<String>) -> AuthResult<TokenPair> {
        let claims = self.guard.execute(refresh_token).await?;

        let device_id = DeviceId::from_uuid(claims.device_id);
        let mut session = self
            .repo
            .find_by_device_id(&device_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        let access_token = self.tokens.issue_access(claims.sub)?;
        let refresh_token = self.tokens.issue_refresh(claims.sub, claims.device_id)?;
        let new_claims = self
            .tokens
            .decode_refresh_unverified(&refresh_token)
            .ok_or_else(|| AuthError::Internal("issued token failed to decode".to_string()))?;

        session.rearm(new_claims.iat, new_claims.exp, ip);
        DeviceSessionRepository::update(self.repo.as_ref(), &session).await?;

        tracing::info!(
            user_id = %session.user_id,
            device_id = %device_id,
            "Refresh token rotated"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::login::tests::Fixture;
    use crate::infra::memory::InMemoryAuthRepository;

    fn use_case(fx: &Fixture) -> RefreshSessionUseCase<InMemoryAuthRepository> {
        RefreshSessionUseCase::new(fx.repo.clone(), fx.tokens.clone())
    }

    #[tokio::test]
    async fn test_rotation_keeps_device_and_advances_iat() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let pair = fx.login("alice", "Pwd123").await.unwrap();
        let old = fx
            .tokens
            .decode_refresh_unverified(&pair.refresh_token)
            .unwrap();

        // Same-second rotations keep the same iat, so wait one tick
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let rotated = use_case(&fx)
            .execute(&pair.refresh_token, Some("10.0.0.2".to_string()))
            .await
            .unwrap();
        let new = fx
            .tokens
            .decode_refresh_unverified(&rotated.refresh_token)
            .unwrap();

        assert_eq!(new.device_id, old.device_id);
        assert_eq!(new.sub, old.sub);
        assert!(new.iat > old.iat);

        let session = fx
            .repo
            .find_by_device_id(&DeviceId::from_uuid(new.device_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.iat, new.iat);
        assert_eq!(session.ip.as_deref(), Some("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_old_token_rejected_after_rotation() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let pair = fx.login("alice", "Pwd123").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let rotated = use_case(&fx)
            .execute(&pair.refresh_token, None)
            .await
            .unwrap();

        // The superseded token no longer rotates
        let replay = use_case(&fx).execute(&pair.refresh_token, None).await;
        assert!(matches!(replay, Err(AuthError::Unauthorized)));

        // The fresh one still does
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert!(
            use_case(&fx)
                .execute(&rotated.refresh_token, None)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_rotation_requires_live_session() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let pair = fx.login("alice", "Pwd123").await.unwrap();

        let claims = fx
            .tokens
            .decode_refresh_unverified(&pair.refresh_token)
            .unwrap();
        DeviceSessionRepository::delete(fx.repo.as_ref(), &DeviceId::from_uuid(claims.device_id))
            .await
            .unwrap();

        let result = use_case(&fx).execute(&pair.refresh_token, None).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }
}
