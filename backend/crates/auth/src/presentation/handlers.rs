//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::client::extract_device_info;
use platform::rate_limit::RateLimitStore;
use platform::token::TokenCodec;

use crate::application::config::AuthConfig;
use crate::application::{
    ConfirmEmailUseCase, CurrentUserUseCase, DeviceSessionsUseCase, LoginInput, LoginUseCase,
    LogoutUseCase, PasswordRecoveryUseCase, RefreshSessionUseCase, RegisterInput, RegisterUseCase,
};
use crate::domain::repository::{AccountRepository, DeviceSessionRepository, EmailGateway};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AccessTokenResponse, ConfirmationRequest, DeviceViewModel, LoginRequest, MeResponse,
    NewPasswordRequest, RecoveryRequest, RegistrationRequest, ResendRequest,
};

/// Shared state for auth handlers
pub struct AuthAppState<R, G, L>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub email_gateway: Arc<G>,
    pub rate_limiter: Arc<L>,
    pub tokens: Arc<TokenCodec>,
    pub config: Arc<AuthConfig>,
}

impl<R, G, L> AuthAppState<R, G, L>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, email_gateway: Arc<G>, rate_limiter: Arc<L>, config: AuthConfig) -> Self {
        let tokens = Arc::new(config.token_codec());
        Self {
            repo,
            email_gateway,
            rate_limiter,
            tokens,
            config: Arc::new(config),
        }
    }
}

// Arc fields only, so Clone never requires the inner types to be Clone
impl<R, G, L> Clone for AuthAppState<R, G, L>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            email_gateway: self.email_gateway.clone(),
            rate_limiter: self.rate_limiter.clone(),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /auth/login
pub async fn login<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let device = extract_device_info(&headers, Some(addr.ip()));
    let ip = device.ip_string();

    let use_case = LoginUseCase::new(state.repo.clone(), state.tokens.clone());

    let pair = use_case
        .execute(LoginInput {
            login_or_email: req.login_or_email,
            password: req.password,
            device_title: device.device_title,
            ip,
        })
        .await
        .map_err(remap_login_error)?;

    let cookie = build_refresh_cookie(&state.config, &pair.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AccessTokenResponse {
            access_token: pair.access_token,
        }),
    ))
}

// Wrong credentials, unknown account and unconfirmed email all collapse
// to a status-only 401 on this route
fn remap_login_error(err: AuthError) -> AuthError {
    match err {
        AuthError::AccountNotFound
        | AuthError::EmailNotConfirmed
        | AuthError::WrongPassword
        | AuthError::Validation { .. } => AuthError::Unauthorized,
        other => other,
    }
}

// ============================================================================
// Current User
// ============================================================================

/// GET /auth/me
pub async fn me<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    headers: HeaderMap,
) -> AuthResult<Json<MeResponse>>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let token = extract_bearer_token(&headers).ok_or(AuthError::Unauthorized)?;

    let use_case = CurrentUserUseCase::new(state.repo.clone(), state.tokens.clone());
    let account = use_case.execute(&token).await?;

    Ok(Json(MeResponse {
        user_id: account.user_id.to_string(),
        login: account.login.as_str().to_string(),
        email: account.email.as_str().to_string(),
    }))
}

// ============================================================================
// Registration
// ============================================================================

/// POST /auth/registration
pub async fn registration<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    Json(req): Json<RegistrationRequest>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.email_gateway.clone(),
        state.config.clone(),
    );

    use_case
        .execute(RegisterInput {
            login: req.login,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/registration-confirmation
pub async fn registration_confirmation<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    Json(req): Json<ConfirmationRequest>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let use_case = ConfirmEmailUseCase::new(
        state.repo.clone(),
        state.email_gateway.clone(),
        state.config.clone(),
    );

    use_case.confirm(&req.code).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/registration-email-resending
pub async fn registration_email_resending<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    Json(req): Json<ResendRequest>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let use_case = ConfirmEmailUseCase::new(
        state.repo.clone(),
        state.email_gateway.clone(),
        state.config.clone(),
    );

    use_case.resend(&req.email).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Password Recovery
// ============================================================================

/// POST /auth/password-recovery
pub async fn password_recovery<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    Json(req): Json<RecoveryRequest>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let use_case = PasswordRecoveryUseCase::new(
        state.repo.clone(),
        state.email_gateway.clone(),
        state.config.clone(),
    );

    use_case.request(&req.email).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/new-password
pub async fn new_password<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    Json(req): Json<NewPasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let use_case = PasswordRecoveryUseCase::new(
        state.repo.clone(),
        state.email_gateway.clone(),
        state.config.clone(),
    );

    use_case.reset(&req.recovery_code, req.new_password).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Refresh / Logout
// ============================================================================

/// POST /auth/refresh-token
pub async fn refresh_token<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let token = extract_refresh_cookie(&state.config, &headers)?;
    let device = extract_device_info(&headers, Some(addr.ip()));

    let use_case = RefreshSessionUseCase::new(state.repo.clone(), state.tokens.clone());
    let pair = use_case.execute(&token, device.ip_string()).await?;

    let cookie = build_refresh_cookie(&state.config, &pair.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AccessTokenResponse {
            access_token: pair.access_token,
        }),
    ))
}

/// POST /auth/logout
pub async fn logout<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let token = extract_refresh_cookie(&state.config, &headers)?;

    let use_case = LogoutUseCase::new(state.repo.clone(), state.tokens.clone());
    use_case.execute(&token).await?;

    let cookie = state.config.cookie.build_delete_cookie();

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

// ============================================================================
// Device Sessions
// ============================================================================

/// GET /security/devices
pub async fn list_devices<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    headers: HeaderMap,
) -> AuthResult<Json<Vec<DeviceViewModel>>>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let token = extract_refresh_cookie(&state.config, &headers)?;

    let use_case = DeviceSessionsUseCase::new(state.repo.clone(), state.tokens.clone());
    let sessions = use_case.list(&token).await?;

    Ok(Json(
        sessions.iter().map(DeviceViewModel::from_session).collect(),
    ))
}

/// DELETE /security/devices
pub async fn terminate_other_devices<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    headers: HeaderMap,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let token = extract_refresh_cookie(&state.config, &headers)?;

    let use_case = DeviceSessionsUseCase::new(state.repo.clone(), state.tokens.clone());
    use_case.terminate_others(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /security/devices/{device_id}
pub async fn terminate_device<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    headers: HeaderMap,
    Path(device_id): Path<String>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let token = extract_refresh_cookie(&state.config, &headers)?;

    let use_case = DeviceSessionsUseCase::new(state.repo.clone(), state.tokens.clone());
    use_case.terminate(&token, &device_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Testing
// ============================================================================

/// DELETE /testing/all-data
pub async fn delete_all_data<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let sessions = DeviceSessionRepository::delete_all(state.repo.as_ref()).await?;
    let accounts = AccountRepository::delete_all(state.repo.as_ref()).await?;

    tracing::warn!(accounts, sessions, "All auth data wiped");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
}

fn extract_refresh_cookie(config: &AuthConfig, headers: &HeaderMap) -> AuthResult<String> {
    platform::cookie::extract_cookie(headers, &config.cookie.name).ok_or(AuthError::Unauthorized)
}

fn build_refresh_cookie(config: &AuthConfig, token: &str) -> String {
    let mut cookie = config.cookie.clone();
    cookie.max_age_secs = Some(config.refresh_token_ttl.as_secs() as i64);
    cookie.build_set_cookie(token)
}
