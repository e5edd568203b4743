//! Device Sessions Use Case
//!
//! Lists and terminates a user's active device sessions. Every operation
//! is gated on a valid refresh token, not just an access token, so a
//! stolen access token alone cannot enumerate or kill sessions.

use std::str::FromStr;
use std::sync::Arc;

use platform::token::TokenCodec;

use crate::application::refresh_guard::RefreshTokenGuard;
use crate::domain::entity::device_session::DeviceSession;
use crate::domain::repository::{AccountRepository, DeviceSessionRepository};
use crate::domain::value_object::{DeviceId, UserId};
use crate::error::{AuthError, AuthResult};

/// Device sessions use case
pub struct DeviceSessionsUseCase<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    repo: Arc<R>,
    guard: RefreshTokenGuard<R>,
}

impl<R> DeviceSessionsUseCase<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenCodec>) -> Self {
        let guard = RefreshTokenGuard::new(repo.clone(), tokens);
        Self { repo, guard }
    }

    /// All active sessions of the token's owner.
    pub async fn list(&self, refresh_token: &str) -> AuthResult<Vec<DeviceSession>> {
        let claims = self.guard.execute(refresh_token).await?;
        let user_id = UserId::from_uuid(claims.sub);
        DeviceSessionRepository::find_by_user_id(self.repo.as_ref(), &user_id).await
    }

    /// Terminate every session except the calling device's.
    pub async fn terminate_others(&self, refresh_token: &str) -> AuthResult<()> {
        let claims = self.guard.execute(refresh_token).await?;
        let user_id = UserId::from_uuid(claims.sub);
        let current = DeviceId::from_uuid(claims.device_id);

        let removed = self
            .repo
            .delete_all_for_user(&user_id, Some(&current))
            .await?;

        tracing::info!(
            user_id = %user_id,
            device_id = %current,
            removed,
            "Terminated other device sessions"
        );
        Ok(())
    }

    /// Terminate one session by device id.
    ///
    /// The token is validated before the id is even parsed; a malformed
    /// id cannot name any session, so it is NotFound. An unknown device
    /// is NotFound; a device owned by another user is Forbidden. NotFound
    /// is checked first.
    pub async fn terminate(&self, refresh_token: &str, device_id: &str) -> AuthResult<()> {
        let claims = self.guard.execute(refresh_token).await?;

        let device_id = DeviceId::from_str(device_id).map_err(|_| AuthError::SessionNotFound)?;

        let session = self
            .repo
            .find_by_device_id(&device_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.user_id.into_uuid() != claims.sub {
            return Err(AuthError::Forbidden);
        }

        DeviceSessionRepository::delete(self.repo.as_ref(), &device_id).await?;

        tracing::info!(
            user_id = %session.user_id,
            device_id = %device_id,
            "Terminated device session"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::login::tests::Fixture;
    use crate::infra::memory::InMemoryAuthRepository;

    fn use_case(fx: &Fixture) -> DeviceSessionsUseCase<InMemoryAuthRepository> {
        DeviceSessionsUseCase::new(fx.repo.clone(), fx.tokens.clone())
    }

    #[tokio::test]
    async fn test_list_shows_all_devices_of_owner() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let first = fx.login("alice", "Pwd123").await.unwrap();
        fx.login("alice", "Pwd123").await.unwrap();
        fx.login("alice", "Pwd123").await.unwrap();

        let sessions = use_case(&fx).list(&first.refresh_token).await.unwrap();
        assert_eq!(sessions.len(), 3);
    }

    #[tokio::test]
    async fn test_terminate_others_spares_caller() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let first = fx.login("alice", "Pwd123").await.unwrap();
        fx.login("alice", "Pwd123").await.unwrap();
        fx.login("alice", "Pwd123").await.unwrap();

        use_case(&fx)
            .terminate_others(&first.refresh_token)
            .await
            .unwrap();

        let sessions = use_case(&fx).list(&first.refresh_token).await.unwrap();
        assert_eq!(sessions.len(), 1);

        let claims = fx
            .tokens
            .decode_refresh_unverified(&first.refresh_token)
            .unwrap();
        assert_eq!(sessions[0].device_id.into_uuid(), claims.device_id);
    }

    #[tokio::test]
    async fn test_terminate_own_device() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let first = fx.login("alice", "Pwd123").await.unwrap();
        let second = fx.login("alice", "Pwd123").await.unwrap();

        let second_claims = fx
            .tokens
            .decode_refresh_unverified(&second.refresh_token)
            .unwrap();
        let target = DeviceId::from_uuid(second_claims.device_id);

        use_case(&fx)
            .terminate(&first.refresh_token, &target.to_string())
            .await
            .unwrap();

        assert!(
            fx.repo
                .find_by_device_id(&target)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_terminate_foreign_device_is_forbidden() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        fx.register_confirmed("bob99", "b@x.com", "Pwd123").await;
        let alice = fx.login("alice", "Pwd123").await.unwrap();
        let bob = fx.login("bob99", "Pwd123").await.unwrap();

        let bob_claims = fx
            .tokens
            .decode_refresh_unverified(&bob.refresh_token)
            .unwrap();
        let target = DeviceId::from_uuid(bob_claims.device_id);

        let result = use_case(&fx)
            .terminate(&alice.refresh_token, &target.to_string())
            .await;
        assert!(matches!(result, Err(AuthError::Forbidden)));

        // Bob's session survives the attempt
        assert!(
            fx.repo
                .find_by_device_id(&target)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_terminate_unknown_device_is_not_found() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let alice = fx.login("alice", "Pwd123").await.unwrap();

        let result = use_case(&fx)
            .terminate(&alice.refresh_token, &DeviceId::new().to_string())
            .await;
        assert!(matches!(result, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_terminate_malformed_id_is_not_found() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let alice = fx.login("alice", "Pwd123").await.unwrap();

        let result = use_case(&fx)
            .terminate(&alice.refresh_token, "not-a-uuid")
            .await;
        assert!(matches!(result, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_terminate_without_valid_token_is_unauthorized_even_for_bad_id() {
        let fx = Fixture::new();

        // The token check comes before the id is looked at
        let result = use_case(&fx).terminate("garbage", "not-a-uuid").await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_list_requires_valid_token() {
        let fx = Fixture::new();

        let result = use_case(&fx).list("garbage").await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }
}
