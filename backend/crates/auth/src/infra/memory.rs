//! In-Memory Repository
//!
//! `Mutex<HashMap>` implementation of both repositories. Backs the
//! use-case tests and doubles as a dev store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::entity::{account::Account, device_session::DeviceSession};
use crate::domain::repository::{AccountRepository, DeviceSessionRepository};
use crate::domain::value_object::{DeviceId, Email, Login, UserId};
use crate::error::{AuthError, AuthResult};

/// In-memory auth store
#[derive(Clone, Default)]
pub struct InMemoryAuthRepository {
    accounts: Arc<Mutex<HashMap<Uuid, Account>>>,
    sessions: Arc<Mutex<HashMap<Uuid, DeviceSession>>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self) -> AuthResult<MutexGuard<'_, HashMap<Uuid, Account>>> {
        self.accounts
            .lock()
            .map_err(|_| AuthError::Internal("account store lock poisoned".to_string()))
    }

    fn sessions(&self) -> AuthResult<MutexGuard<'_, HashMap<Uuid, DeviceSession>>> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::Internal("session store lock poisoned".to_string()))
    }
}

impl AccountRepository for InMemoryAuthRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        self.accounts()?
            .insert(account.user_id.into_uuid(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<Account>> {
        Ok(self.accounts()?.get(user_id.as_uuid()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts()?
            .values()
            .find(|a| a.email == *email)
            .cloned())
    }

    async fn find_by_login_or_email(&self, value: &str) -> AuthResult<Option<Account>> {
        // Stored emails are lowercased, so the email arm matches case-insensitively
        let email = value.to_lowercase();
        Ok(self
            .accounts()?
            .values()
            .find(|a| a.login.as_str() == value || a.email.as_str() == email)
            .cloned())
    }

    async fn find_by_confirmation_code(&self, code: &str) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts()?
            .values()
            .find(|a| a.email_confirmation.code == code)
            .cloned())
    }

    async fn find_by_recovery_code(&self, code: &str) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts()?
            .values()
            .find(|a| {
                a.password_recovery
                    .as_ref()
                    .is_some_and(|r| r.code == code)
            })
            .cloned())
    }

    async fn exists_by_login(&self, login: &Login) -> AuthResult<bool> {
        Ok(self.accounts()?.values().any(|a| a.login == *login))
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.accounts()?.values().any(|a| a.email == *email))
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        self.accounts()?
            .insert(account.user_id.into_uuid(), account.clone());
        Ok(())
    }

    async fn delete_all(&self) -> AuthResult<u64> {
        let mut accounts = self.accounts()?;
        let count = accounts.len() as u64;
        accounts.clear();
        Ok(count)
    }
}

impl DeviceSessionRepository for InMemoryAuthRepository {
    async fn create(&self, session: &DeviceSession) -> AuthResult<()> {
        self.sessions()?
            .insert(session.device_id.into_uuid(), session.clone());
        Ok(())
    }

    async fn find_by_device_id(&self, device_id: &DeviceId) -> AuthResult<Option<DeviceSession>> {
        Ok(self.sessions()?.get(device_id.as_uuid()).cloned())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<DeviceSession>> {
        Ok(self
            .sessions()?
            .values()
            .filter(|s| s.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, session: &DeviceSession) -> AuthResult<()> {
        self.sessions()?
            .insert(session.device_id.into_uuid(), session.clone());
        Ok(())
    }

    async fn delete(&self, device_id: &DeviceId) -> AuthResult<()> {
        self.sessions()?.remove(device_id.as_uuid());
        Ok(())
    }

    async fn delete_all_for_user(
        &self,
        user_id: &UserId,
        except: Option<&DeviceId>,
    ) -> AuthResult<u64> {
        let mut sessions = self.sessions()?;
        let before = sessions.len();
        sessions.retain(|_, s| {
            s.user_id != *user_id || except.is_some_and(|keep| s.device_id == *keep)
        });
        Ok((before - sessions.len()) as u64)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = chrono::Utc::now().timestamp();
        let mut sessions = self.sessions()?;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_all(&self) -> AuthResult<u64> {
        let mut sessions = self.sessions()?;
        let count = sessions.len() as u64;
        sessions.clear();
        Ok(count)
    }
}
