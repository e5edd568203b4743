//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use platform::rate_limit::{RateLimitConfig, RateLimitDecision, RateLimitStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::account::{Account, EmailConfirmation, PasswordRecovery};
use crate::domain::entity::device_session::DeviceSession;
use crate::domain::repository::{AccountRepository, DeviceSessionRepository};
use crate::domain::value_object::{DeviceId, Email, Login, UserId};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up sessions whose refresh token expired
    pub async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let now = Utc::now().timestamp();

        let deleted = sqlx::query("DELETE FROM device_sessions WHERE exp < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired device sessions");

        Ok(deleted)
    }
}

const ACCOUNT_COLUMNS: &str = r#"
    user_id,
    login,
    email,
    password_hash,
    confirmation_code,
    confirmation_expires_at,
    is_confirmed,
    recovery_code,
    recovery_expires_at,
    created_at
"#;

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                user_id,
                login,
                email,
                password_hash,
                confirmation_code,
                confirmation_expires_at,
                is_confirmed,
                recovery_code,
                recovery_expires_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.user_id.as_uuid())
        .bind(account.login.as_str())
        .bind(account.email.as_str())
        .bind(account.password_hash.as_phc_string())
        .bind(&account.email_confirmation.code)
        .bind(account.email_confirmation.expires_at)
        .bind(account.email_confirmation.is_confirmed)
        .bind(account.password_recovery.as_ref().map(|r| r.code.as_str()))
        .bind(account.password_recovery.as_ref().map(|r| r.expires_at))
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_login_or_email(&self, value: &str) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE login = $1 OR email = LOWER($1)"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_confirmation_code(&self, code: &str) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE confirmation_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_recovery_code(&self, code: &str) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE recovery_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn exists_by_login(&self, login: &Login) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE login = $1)",
        )
        .bind(login.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                password_hash = $2,
                confirmation_code = $3,
                confirmation_expires_at = $4,
                is_confirmed = $5,
                recovery_code = $6,
                recovery_expires_at = $7
            WHERE user_id = $1
            "#,
        )
        .bind(account.user_id.as_uuid())
        .bind(account.password_hash.as_phc_string())
        .bind(&account.email_confirmation.code)
        .bind(account.email_confirmation.expires_at)
        .bind(account.email_confirmation.is_confirmed)
        .bind(account.password_recovery.as_ref().map(|r| r.code.as_str()))
        .bind(account.password_recovery.as_ref().map(|r| r.expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_all(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM accounts")
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Device Session Repository Implementation
// ============================================================================

impl DeviceSessionRepository for PgAuthRepository {
    async fn create(&self, session: &DeviceSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO device_sessions (
                device_id,
                user_id,
                ip,
                device_title,
                iat,
                exp
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.device_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(&session.ip)
        .bind(&session.device_title)
        .bind(session.iat)
        .bind(session.exp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_device_id(&self, device_id: &DeviceId) -> AuthResult<Option<DeviceSession>> {
        let row = sqlx::query_as::<_, DeviceSessionRow>(
            r#"
            SELECT device_id, user_id, ip, device_title, iat, exp
            FROM device_sessions
            WHERE device_id = $1
            "#,
        )
        .bind(device_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<DeviceSession>> {
        let rows = sqlx::query_as::<_, DeviceSessionRow>(
            r#"
            SELECT device_id, user_id, ip, device_title, iat, exp
            FROM device_sessions
            WHERE user_id = $1
            ORDER BY iat ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_session()).collect())
    }

    async fn update(&self, session: &DeviceSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE device_sessions SET
                ip = $2,
                iat = $3,
                exp = $4
            WHERE device_id = $1
            "#,
        )
        .bind(session.device_id.as_uuid())
        .bind(&session.ip)
        .bind(session.iat)
        .bind(session.exp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, device_id: &DeviceId) -> AuthResult<()> {
        sqlx::query("DELETE FROM device_sessions WHERE device_id = $1")
            .bind(device_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_user(
        &self,
        user_id: &UserId,
        except: Option<&DeviceId>,
    ) -> AuthResult<u64> {
        let deleted = match except {
            Some(except_id) => {
                sqlx::query("DELETE FROM device_sessions WHERE user_id = $1 AND device_id != $2")
                    .bind(user_id.as_uuid())
                    .bind(except_id.as_uuid())
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
            None => {
                sqlx::query("DELETE FROM device_sessions WHERE user_id = $1")
                    .bind(user_id.as_uuid())
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
        };

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        self.cleanup_expired_sessions().await
    }

    async fn delete_all(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM device_sessions")
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Rate Limit Store Implementation
// ============================================================================

/// PostgreSQL-backed rate limit store.
///
/// One row per identity; the window start and counter roll over in a
/// single upsert so concurrent requests cannot lose increments.
#[derive(Clone)]
pub struct PgRateLimitStore {
    pool: PgPool,
}

impl PgRateLimitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop rows whose window closed before the current one could reuse them.
    pub async fn cleanup_expired(&self, config: &RateLimitConfig) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_rate_limits WHERE window_start_ms + $1 < $2")
            .bind(config.window_ms())
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

impl RateLimitStore for PgRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, Box<dyn std::error::Error + Send + Sync>> {
        let now_ms = Utc::now().timestamp_millis();

        let (window_start_ms, request_count) = sqlx::query_as::<_, (i64, i32)>(
            r#"
            INSERT INTO auth_rate_limits (identity, window_start_ms, request_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (identity) DO UPDATE SET
                request_count = CASE
                    WHEN $2 > auth_rate_limits.window_start_ms + $3 THEN 1
                    ELSE auth_rate_limits.request_count + 1
                END,
                window_start_ms = CASE
                    WHEN $2 > auth_rate_limits.window_start_ms + $3 THEN $2
                    ELSE auth_rate_limits.window_start_ms
                END
            RETURNING window_start_ms, request_count
            "#,
        )
        .bind(key)
        .bind(now_ms)
        .bind(config.window_ms())
        .fetch_one(&self.pool)
        .await?;

        let count = request_count as u32;
        Ok(RateLimitDecision {
            allowed: count <= config.max_requests,
            remaining: config.max_requests.saturating_sub(count),
            reset_at_ms: window_start_ms + config.window_ms(),
        })
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    user_id: Uuid,
    login: String,
    email: String,
    password_hash: String,
    confirmation_code: String,
    confirmation_expires_at: DateTime<Utc>,
    is_confirmed: bool,
    recovery_code: Option<String>,
    recovery_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        let password_recovery = match (self.recovery_code, self.recovery_expires_at) {
            (Some(code), Some(expires_at)) => Some(PasswordRecovery { code, expires_at }),
            _ => None,
        };

        Ok(Account {
            user_id: UserId::from_uuid(self.user_id),
            login: Login::from_db(self.login),
            email: Email::from_db(self.email),
            password_hash,
            email_confirmation: EmailConfirmation {
                code: self.confirmation_code,
                expires_at: self.confirmation_expires_at,
                is_confirmed: self.is_confirmed,
            },
            password_recovery,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DeviceSessionRow {
    device_id: Uuid,
    user_id: Uuid,
    ip: Option<String>,
    device_title: String,
    iat: i64,
    exp: i64,
}

impl DeviceSessionRow {
    fn into_session(self) -> DeviceSession {
        DeviceSession {
            user_id: UserId::from_uuid(self.user_id),
            device_id: DeviceId::from_uuid(self.device_id),
            ip: self.ip,
            device_title: self.device_title,
            iat: self.iat,
            exp: self.exp,
        }
    }
}
