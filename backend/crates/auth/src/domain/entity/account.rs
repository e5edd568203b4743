//! Account Entity
//!
//! A registered user with its email-confirmation and password-recovery
//! state. State transitions live on the entity and either mutate it or
//! return the precise domain error; persisting the result is a separate
//! repository step.

use chrono::{DateTime, Duration, Utc};
use platform::crypto::constant_time_eq;
use platform::password::HashedPassword;
use uuid::Uuid;

use crate::domain::value_object::{Email, Login, UserId};
use crate::error::{AuthError, AuthResult};

/// Email-confirmation state, set with a fresh code at registration
#[derive(Debug, Clone)]
pub struct EmailConfirmation {
    /// One-time confirmation code
    pub code: String,
    /// Code expiration
    pub expires_at: DateTime<Utc>,
    /// Flipped to true exactly once
    pub is_confirmed: bool,
}

/// Password-recovery state, present only while a recovery is pending
#[derive(Debug, Clone)]
pub struct PasswordRecovery {
    /// One-time recovery code
    pub code: String,
    /// Code expiration
    pub expires_at: DateTime<Utc>,
}

/// Account entity
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: UserId,
    /// Unique login handle
    pub login: Login,
    /// Unique email address
    pub email: Email,
    /// Argon2id PHC hash, never the plaintext
    pub password_hash: HashedPassword,
    pub email_confirmation: EmailConfirmation,
    pub password_recovery: Option<PasswordRecovery>,
    /// Immutable creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new unconfirmed account with a fresh confirmation code.
    pub fn new(login: Login, email: Email, password_hash: HashedPassword, code_ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            login,
            email,
            password_hash,
            email_confirmation: EmailConfirmation {
                code: Self::generate_code(),
                expires_at: now + code_ttl,
                is_confirmed: false,
            },
            password_recovery: None,
            created_at: now,
        }
    }

    /// Whether the email has been confirmed
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmation.is_confirmed
    }

    /// Mark the email confirmed.
    ///
    /// The caller resolved this account by its confirmation code, so the
    /// remaining checks are already-confirmed and expiry, in that order.
    pub fn confirm_email(&mut self) -> AuthResult<()> {
        if self.email_confirmation.is_confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }
        if Utc::now() > self.email_confirmation.expires_at {
            return Err(AuthError::ConfirmationCodeExpired);
        }

        self.email_confirmation.is_confirmed = true;
        Ok(())
    }

    /// Replace the confirmation code with a brand-new one.
    pub fn renew_confirmation_code(&mut self, code_ttl: Duration) -> AuthResult<&str> {
        if self.email_confirmation.is_confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }

        self.email_confirmation.code = Self::generate_code();
        self.email_confirmation.expires_at = Utc::now() + code_ttl;
        Ok(&self.email_confirmation.code)
    }

    /// Begin a password recovery: issue a code with an expiration.
    pub fn start_recovery(&mut self, code_ttl: Duration) -> String {
        let code = Self::generate_code();
        self.password_recovery = Some(PasswordRecovery {
            code: code.clone(),
            expires_at: Utc::now() + code_ttl,
        });
        code
    }

    /// Complete a password recovery: verify the code and swap the hash.
    ///
    /// Clears the recovery state on success so the code is single-use.
    pub fn reset_password(&mut self, code: &str, new_hash: HashedPassword) -> AuthResult<()> {
        let recovery = self
            .password_recovery
            .as_ref()
            .ok_or(AuthError::RecoveryCodeInvalid)?;

        if !constant_time_eq(recovery.code.as_bytes(), code.as_bytes()) {
            return Err(AuthError::RecoveryCodeInvalid);
        }
        if Utc::now() > recovery.expires_at {
            return Err(AuthError::RecoveryCodeInvalid);
        }

        self.password_hash = new_hash;
        self.password_recovery = None;
        Ok(())
    }

    fn generate_code() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::ClearTextPassword;

    fn account() -> Account {
        let hash = ClearTextPassword::new("Pwd123".to_string())
            .unwrap()
            .hash()
            .unwrap();
        Account::new(
            Login::new("alice").unwrap(),
            Email::new("a@x.com").unwrap(),
            hash,
            Duration::hours(1),
        )
    }

    #[test]
    fn test_new_account_has_pending_confirmation() {
        let account = account();
        assert!(!account.is_confirmed());
        assert!(!account.email_confirmation.code.is_empty());
        assert!(account.email_confirmation.expires_at > Utc::now());
        assert!(account.password_recovery.is_none());
    }

    #[test]
    fn test_confirm_email_exactly_once() {
        let mut account = account();
        assert!(account.confirm_email().is_ok());
        assert!(account.is_confirmed());

        assert!(matches!(
            account.confirm_email(),
            Err(AuthError::AlreadyConfirmed)
        ));
    }

    #[test]
    fn test_confirm_expired_code() {
        let mut account = account();
        account.email_confirmation.expires_at = Utc::now() - Duration::minutes(1);

        assert!(matches!(
            account.confirm_email(),
            Err(AuthError::ConfirmationCodeExpired)
        ));
        assert!(!account.is_confirmed());
    }

    #[test]
    fn test_already_confirmed_wins_over_expired() {
        let mut account = account();
        account.confirm_email().unwrap();
        account.email_confirmation.expires_at = Utc::now() - Duration::minutes(1);

        assert!(matches!(
            account.confirm_email(),
            Err(AuthError::AlreadyConfirmed)
        ));
    }

    #[test]
    fn test_renew_confirmation_code_changes_code() {
        let mut account = account();
        let old_code = account.email_confirmation.code.clone();

        let new_code = account.renew_confirmation_code(Duration::hours(1)).unwrap();
        assert_ne!(new_code, old_code);
    }

    #[test]
    fn test_renew_rejected_after_confirmation() {
        let mut account = account();
        account.confirm_email().unwrap();

        assert!(matches!(
            account.renew_confirmation_code(Duration::hours(1)),
            Err(AuthError::AlreadyConfirmed)
        ));
    }

    #[test]
    fn test_recovery_roundtrip() {
        let mut account = account();
        let code = account.start_recovery(Duration::hours(1));

        let new_hash = ClearTextPassword::new("NewPwd9".to_string())
            .unwrap()
            .hash()
            .unwrap();
        assert!(account.reset_password(&code, new_hash).is_ok());

        // Recovery state cleared: the code is single-use
        assert!(account.password_recovery.is_none());
        let another_hash = ClearTextPassword::new("OtherPwd".to_string())
            .unwrap()
            .hash()
            .unwrap();
        assert!(matches!(
            account.reset_password(&code, another_hash),
            Err(AuthError::RecoveryCodeInvalid)
        ));
    }

    #[test]
    fn test_reset_with_wrong_code() {
        let mut account = account();
        account.start_recovery(Duration::hours(1));

        let new_hash = ClearTextPassword::new("NewPwd9".to_string())
            .unwrap()
            .hash()
            .unwrap();
        assert!(matches!(
            account.reset_password("wrong-code", new_hash),
            Err(AuthError::RecoveryCodeInvalid)
        ));
        assert!(account.password_recovery.is_some());
    }

    #[test]
    fn test_reset_with_expired_code() {
        let mut account = account();
        let code = account.start_recovery(Duration::hours(1));
        account.password_recovery.as_mut().unwrap().expires_at =
            Utc::now() - Duration::minutes(1);

        let new_hash = ClearTextPassword::new("NewPwd9".to_string())
            .unwrap()
            .hash()
            .unwrap();
        assert!(matches!(
            account.reset_password(&code, new_hash),
            Err(AuthError::RecoveryCodeInvalid)
        ));
    }
}
