//! Email Confirmation Use Case
//!
//! Confirms a pending registration code and resends confirmation emails.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{AccountRepository, EmailGateway};
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

/// Email confirmation use case
pub struct ConfirmEmailUseCase<R, G>
where
    R: AccountRepository,
    G: EmailGateway + Send + Sync + 'static,
{
    accounts: Arc<R>,
    email_gateway: Arc<G>,
    config: Arc<AuthConfig>,
}

impl<R, G> ConfirmEmailUseCase<R, G>
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

    /// Confirm the email behind a registration code.
    ///
    /// Checks in order: code unknown, already confirmed, code expired.
    pub async fn confirm(&self, code: &str) -> AuthResult<()> {
        let mut account = self
            .accounts
            .find_by_confirmation_code(code)
            .await?
            .ok_or(AuthError::ConfirmationCodeInvalid)?;

        account.confirm_email()?;
        self.accounts.update(&account).await?;

        tracing::info!(user_id = %account.user_id, "Email confirmed");
        Ok(())
    }

    /// Issue a brand-new confirmation code and resend the email.
    ///
    /// Unlike registration, this send is awaited: the caller asked for
    /// the email explicitly, so a dispatch failure is surfaced.
    pub async fn resend(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email).map_err(|e| AuthError::Validation {
            field: "email",
            message: e.to_string(),
        })?;

        let mut account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::EmailUnknown)?;

        if account.is_confirmed() {
            return Err(AuthError::Validation {
                field: "email",
                message: "Email is already confirmed".to_string(),
            });
        }

        let code = account
            .renew_confirmation_code(self.config.code_ttl_chrono())?
            .to_string();
        self.accounts.update(&account).await?;

        self.email_gateway
            .send_confirmation(&account.email, &code)
            .await?;

        tracing::info!(user_id = %account.user_id, "Confirmation email resent");
        Ok(())
    }
}
