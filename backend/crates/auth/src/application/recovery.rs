//! Password Recovery Use Case
//!
//! Issues recovery codes and completes password resets.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::domain::repository::{AccountRepository, EmailGateway};
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};
use crate::infra::email::{EmailKind, dispatch_in_background};

/// Password recovery use case
pub struct PasswordRecoveryUseCase<R, G>
where
    R: AccountRepository,
    G: EmailGateway + Send + Sync + 'static,
{
    accounts: Arc<R>,
    email_gateway: Arc<G>,
    config: Arc<AuthConfig>,
}

impl<R, G> PasswordRecoveryUseCase<R, G>
where
    R: AccountRepository,
    G: EmailGateway + Send + Sync + 'static,
{
    pub fn new(accounts: Arc<R>, email_gateway: Arc<G>, config: Arc<AuthConfig>) -> Self {
        Self {
            accounts,
            email_gateway,
            config,
        }
    }

    /// Request a recovery code for an email address.
    ///
    /// Succeeds whether or not the email is registered: the response must
    /// not leak account existence.
    pub async fn request(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email).map_err(|e| AuthError::Validation {
            field: "email",
            message: e.to_string(),
        })?;

        let Some(mut account) = self.accounts.find_by_email(&email).await? else {
            tracing::debug!("Password recovery requested for unknown email");
            return Ok(());
        };

        let code = account.start_recovery(self.config.code_ttl_chrono());
        self.accounts.update(&account).await?;

        tracing::info!(user_id = %account.user_id, "Password recovery started");

        // Fire-and-forget: send failures are logged, never surfaced
        dispatch_in_background(
            self.email_gateway.clone(),
            account.email.clone(),
            code,
            EmailKind::Recovery,
        );

        Ok(())
    }

    /// Set a new password using a previously issued recovery code.
    pub async fn reset(&self, recovery_code: &str, new_password: String) -> AuthResult<()> {
        let password = ClearTextPassword::new(new_password).map_err(|e| AuthError::Validation {
            field: "newPassword",
            message: e.to_string(),
        })?;

        let mut account = self
            .accounts
            .find_by_recovery_code(recovery_code)
            .await?
            .ok_or(AuthError::RecoveryCodeInvalid)?;

        let new_hash = password.hash()?;
        account.reset_password(recovery_code, new_hash)?;
        self.accounts.update(&account).await?;

        tracing::info!(user_id = %account.user_id, "Password reset completed");
        Ok(())
    }
}
