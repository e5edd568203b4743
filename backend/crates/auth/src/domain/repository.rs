//! Repository Traits
//!
//! Interfaces for data persistence and outbound notification.
//! Implementations live in the infrastructure layer.

use crate::domain::entity::{account::Account, device_session::DeviceSession};
use crate::domain::value_object::{DeviceId, Email, Login, UserId};
use crate::error::AuthResult;

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Create a new account
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Find account by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<Account>>;

    /// Find account by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    /// Find account where either login or email equals the given value
    async fn find_by_login_or_email(&self, value: &str) -> AuthResult<Option<Account>>;

    /// Find account by pending confirmation code
    async fn find_by_confirmation_code(&self, code: &str) -> AuthResult<Option<Account>>;

    /// Find account by pending recovery code
    async fn find_by_recovery_code(&self, code: &str) -> AuthResult<Option<Account>>;

    /// Check if login is taken
    async fn exists_by_login(&self, login: &Login) -> AuthResult<bool>;

    /// Check if email is taken
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Update account
    async fn update(&self, account: &Account) -> AuthResult<()>;

    /// Wipe all accounts (bulk test-reset only)
    async fn delete_all(&self) -> AuthResult<u64>;
}

/// Device session repository trait
#[trait_variant::make(DeviceSessionRepository: Send)]
pub trait LocalDeviceSessionRepository {
    /// Create a new session
    async fn create(&self, session: &DeviceSession) -> AuthResult<()>;

    /// Find session by device ID
    async fn find_by_device_id(&self, device_id: &DeviceId) -> AuthResult<Option<DeviceSession>>;

    /// Find all sessions for a user
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<DeviceSession>>;

    /// Update session (rotation re-arm)
    async fn update(&self, session: &DeviceSession) -> AuthResult<()>;

    /// Delete a session
    async fn delete(&self, device_id: &DeviceId) -> AuthResult<()>;

    /// Delete all sessions for a user, optionally keeping one device
    async fn delete_all_for_user(
        &self,
        user_id: &UserId,
        except: Option<&DeviceId>,
    ) -> AuthResult<u64>;

    /// Clean up sessions whose refresh token has expired
    async fn cleanup_expired(&self) -> AuthResult<u64>;

    /// Wipe all sessions (bulk test-reset only)
    async fn delete_all(&self) -> AuthResult<u64>;
}

/// Outbound email notification gateway
#[trait_variant::make(EmailGateway: Send)]
pub trait LocalEmailGateway {
    /// Send the registration-confirmation email carrying the code
    async fn send_confirmation(&self, email: &Email, code: &str) -> AuthResult<()>;

    /// Send the password-recovery email carrying the code
    async fn send_recovery(&self, email: &Email, code: &str) -> AuthResult<()>;
}
