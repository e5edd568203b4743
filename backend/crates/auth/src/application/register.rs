//! Register Use Case
//!
//! Creates an unconfirmed account and dispatches the confirmation email.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountRepository, EmailGateway};
use crate::domain::value_object::{Email, Login};
use crate::error::{AuthError, AuthResult};
use crate::infra::email::{EmailKind, dispatch_in_background};

/// Register input
pub struct RegisterInput {
    pub login: String,
    pub email: String,
    pub password: String,
}

/// Register use case
pub struct RegisterUseCase<R, G>
where
    R: AccountRepository,
    G: EmailGateway + Send + Sync + 'static,
{
    accounts: Arc<R>,
    email_gateway: Arc<G>,
    config: Arc<AuthConfig>,
}

impl<R, G> RegisterUseCase<R, G>
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

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<()> {
        let login = Login::new(&input.login).map_err(|e| AuthError::Validation {
            field: "login",
            message: e.to_string(),
        })?;
        let email = Email::new(input.email).map_err(|e| AuthError::Validation {
            field: "email",
            message: e.to_string(),
        })?;
        let password = ClearTextPassword::new(input.password).map_err(|e| AuthError::Validation {
            field: "password",
            message: e.to_string(),
        })?;

        // Login collision takes priority when both are taken
        if self.accounts.exists_by_login(&login).await? {
            return Err(AuthError::LoginTaken);
        }
        if self.accounts.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = password.hash()?;
        let account = Account::new(login, email, password_hash, self.config.code_ttl_chrono());

        self.accounts.create(&account).await?;

        tracing::info!(
            user_id = %account.user_id,
            login = %account.login,
            "Account registered"
        );

        // Fire-and-forget: send failures are logged, never surfaced
        dispatch_in_background(
            self.email_gateway.clone(),
            account.email.clone(),
            account.email_confirmation.code.clone(),
            EmailKind::Confirmation,
        );

        Ok(())
    }
}
