//! Auth Routers

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use platform::rate_limit::RateLimitStore;

use crate::domain::repository::{AccountRepository, DeviceSessionRepository, EmailGateway};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::rate_limit;

/// Routes nested under /auth.
///
/// The credential and code endpoints sit behind the rate limiter; the
/// token-bearing endpoints (me, refresh, logout) do not.
pub fn auth_router<R, G, L>(state: AuthAppState<R, G, L>) -> Router
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let rate_limited = Router::new()
        .route("/login", post(handlers::login::<R, G, L>))
        .route("/registration", post(handlers::registration::<R, G, L>))
        .route(
            "/registration-confirmation",
            post(handlers::registration_confirmation::<R, G, L>),
        )
        .route(
            "/registration-email-resending",
            post(handlers::registration_email_resending::<R, G, L>),
        )
        .route(
            "/password-recovery",
            post(handlers::password_recovery::<R, G, L>),
        )
        .route("/new-password", post(handlers::new_password::<R, G, L>))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::<R, G, L>));

    Router::new()
        .route("/me", get(handlers::me::<R, G, L>))
        .route("/refresh-token", post(handlers::refresh_token::<R, G, L>))
        .route("/logout", post(handlers::logout::<R, G, L>))
        .merge(rate_limited)
        .with_state(state)
}

/// Routes nested under /security.
pub fn security_router<R, G, L>(state: AuthAppState<R, G, L>) -> Router
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/devices",
            get(handlers::list_devices::<R, G, L>)
                .delete(handlers::terminate_other_devices::<R, G, L>),
        )
        .route(
            "/devices/{device_id}",
            delete(handlers::terminate_device::<R, G, L>),
        )
        .with_state(state)
}

/// Routes nested under /testing. Mount only in test environments.
pub fn testing_router<R, G, L>(state: AuthAppState<R, G, L>) -> Router
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    Router::new()
        .route("/all-data", delete(handlers::delete_all_data::<R, G, L>))
        .with_state(state)
}
