//! Login Use Case
//!
//! Verifies credentials and opens a fresh device session.

use std::sync::Arc;

use platform::password::ClearTextPassword;
use platform::token::TokenCodec;

use crate::domain::entity::device_session::DeviceSession;
use crate::domain::repository::{AccountRepository, DeviceSessionRepository};
use crate::domain::value_object::DeviceId;
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    /// Login handle or email address
    pub login_or_email: String,
    pub password: String,
    /// Human-readable device title (from User-Agent)
    pub device_title: String,
    /// Client IP
    pub ip: Option<String>,
}

/// A freshly issued access/refresh token pair
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenCodec>,
}

impl<R> LoginUseCase<R>
where
    R: AccountRepository + DeviceSessionRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenCodec>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<TokenPair> {
        let account = self
            .repo
            .find_by_login_or_email(&input.login_or_email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        // Unconfirmed accounts are rejected before the password is checked
        if !account.is_confirmed() {
            return Err(AuthError::EmailNotConfirmed);
        }

        let password =
            ClearTextPassword::new(input.password).map_err(|_| AuthError::WrongPassword)?;
        if !account.password_hash.verify(&password) {
            return Err(AuthError::WrongPassword);
        }

        let device_id = DeviceId::new();
        let access_token = self.tokens.issue_access(account.user_id.into_uuid())?;
        let refresh_token = self
            .tokens
            .issue_refresh(account.user_id.into_uuid(), device_id.into_uuid())?;

        // The freshly signed token carries the iat/exp the session must mirror
        let claims = self
            .tokens
            .decode_refresh_unverified(&refresh_token)
            .ok_or_else(|| AuthError::Internal("issued token failed to decode".to_string()))?;

        let session = DeviceSession::new(
            account.user_id,
            device_id,
            input.ip,
            input.device_title,
            claims.iat,
            claims.exp,
        );
        DeviceSessionRepository::create(self.repo.as_ref(), &session).await?;

        tracing::info!(
            user_id = %account.user_id,
            device_id = %device_id,
            "User logged in"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
