//! Current User Use Case

use std::sync::Arc;

use platform::token::TokenCodec;

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

/// Current user use case
pub struct CurrentUserUseCase<R>
where
    R: AccountRepository,
{
    accounts: Arc<R>,
    tokens: Arc<TokenCodec>,
}

impl<R> CurrentUserUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(accounts: Arc<R>, tokens: Arc<TokenCodec>) -> Self {
        Self { accounts, tokens }
    }

    /// Resolve the account behind a bearer access token.
    pub async fn execute(&self, access_token: &str) -> AuthResult<Account> {
        let claims = self
            .tokens
            .verify_access(access_token)
            .map_err(|_| AuthError::Unauthorized)?;

        let user_id = UserId::from_uuid(claims.sub);
        self.accounts
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::login::tests::Fixture;
    use crate::infra::memory::InMemoryAuthRepository;

    fn use_case(fx: &Fixture) -> CurrentUserUseCase<InMemoryAuthRepository> {
        CurrentUserUseCase::new(fx.repo.clone(), fx.tokens.clone())
    }

    #[tokio::test]
    async fn test_resolves_account_from_access_token() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let pair = fx.login("alice", "Pwd123").await.unwrap();

        let account = use_case(&fx).execute(&pair.access_token).await.unwrap();
        assert_eq!(account.login.as_str(), "alice");
        assert_eq!(account.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let pair = fx.login("alice", "Pwd123").await.unwrap();

        let result = use_case(&fx).execute(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let fx = Fixture::new();

        let result = use_case(&fx).execute("garbage").await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_deleted_account_rejected() {
        let fx = Fixture::new();
        fx.register_confirmed("alice", "a@x.com", "Pwd123").await;
        let pair = fx.login("alice", "Pwd123").await.unwrap();

        AccountRepository::delete_all(fx.repo.as_ref()).await.unwrap();

        let result = use_case(&fx).execute(&pair.access_token).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }
}
