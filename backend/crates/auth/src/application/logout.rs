//! Logout Use Case

use std::sync::Arc;

use platform::token::TokenCodec;

use crate::application::refresh_guard::RefreshTokenGuard;
use crate::domain::repository::{AccountRepository, DeviceSessionRepository};
use crate::domain::value_object::DeviceId;
use crate::error::AuthResult;

/// Logout use case
pub struct LogoutUseCase<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    repo: Arc<R>,
    guard: RefreshTokenGuard<R>,
}

impl<R> LogoutUseCase<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenCodec>) -> Self {
        let guard = RefreshTokenGuard::new(repo.clone(), tokens);
        Self { repo, guard }
    }

    /// Terminate the session the refresh token belongs to.
    pub async fn execute(&self, refresh_token: &str) -> AuthResult<()> {
        let claims = self.guard.execute(refresh_token).await?;

        let device_id = DeviceId::from_uuid(claims.device_id);
        DeviceSessionRepository::delete(self.repo.as_ref(), &device_id).await?;

        tracing::info!(
            user_id = %claims.sub,
            device_id = %device_id,
            "User logged out"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::login::tests::Fixture;
    use crate::error::AuthError;
    use crate::infra::memory::InMemoryAuthRepository;

    fn use_case(fx: &Fixture) -> LogoutUseCase<InMemoryAuthRepository> {
        LogoutUseCase::new(fx.repo.clone(), fx.tokens.clone())
    }

    #[tokio::test]
    async fn test_logout_deletes_session() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let pair = fx.login("alice", "Pwd123").await.unwrap();
        let claims = fx
            .tokens
            .decode_refresh_unverified(&pair.refresh_token)
            .unwrap();

        use_case(&fx).execute(&pair.refresh_token).await.unwrap();

        let session = fx
            .repo
            .find_by_device_id(&DeviceId::from_uuid(claims.device_id))
            .await
            .unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn test_logout_twice_rejected() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let pair = fx.login("alice", "Pwd123").await.unwrap();

        use_case(&fx).execute(&pair.refresh_token).await.unwrap();

        let result = use_case(&fx).execute(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_logout_leaves_other_devices_alone() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let first = fx.login("alice", "Pwd123").await.unwrap();
        let second = fx.login("alice", "Pwd123").await.unwrap();

        use_case(&fx).execute(&first.refresh_token).await.unwrap();

        let second_claims = fx
            .tokens
            .decode_refresh_unverified(&second.refresh_token)
            .unwrap();
        let session = fx
            .repo
            .find_by_device_id(&DeviceId::from_uuid(second_claims.device_id))
            .await
            .unwrap();
        assert!(session.is_some());
    }
}
