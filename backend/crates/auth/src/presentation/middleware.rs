//! Rate Limit Middleware
//!
//! Gates the public auth endpoints on a per-(IP, route) request counter.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use platform::client::extract_client_ip;
use platform::rate_limit::RateLimitStore;

use crate::domain::repository::{AccountRepository, DeviceSessionRepository, EmailGateway};
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Deny the request once the identity exceeded its window quota.
///
/// The identity is client IP plus route path, so hammering one endpoint
/// does not lock a client out of the others. Store failures let the
/// request through; the limiter must not take the API down with it.
pub async fn rate_limit<R, G, L>(
    State(state): State<AuthAppState<R, G, L>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    R: AccountRepository + DeviceSessionRepository + Send + Sync + 'static,
    G: EmailGateway + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let direct_ip = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip());

    let ip = extract_client_ip(req.headers(), direct_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("{}:{}", ip, req.uri().path());

    match state
        .rate_limiter
        .check_and_increment(&key, &state.config.rate_limit)
        .await
    {
        Ok(decision) if !decision.allowed => {
            tracing::warn!(
                ip = %ip,
                path = %req.uri().path(),
                reset_at_ms = decision.reset_at_ms,
                "Rate limit exceeded"
            );
            AuthError::TooManyRequests.into_response()
        }
        Ok(_) => next.run(req).await,
        Err(e) => {
            tracing::warn!(error = %e, "Rate limit store unavailable, letting request through");
            next.run(req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::infra::email::RecordingEmailGateway;
    use crate::infra::memory::InMemoryAuthRepository;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use platform::rate_limit::MemoryRateLimitStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let state = AuthAppState::new(
            Arc::new(InMemoryAuthRepository::new()),
            Arc::new(RecordingEmailGateway::new()),
            Arc::new(MemoryRateLimitStore::new()),
            AuthConfig::development(),
        );

        Router::new()
            .route("/ping", post(|| async { StatusCode::NO_CONTENT }))
            .route("/pong", post(|| async { StatusCode::NO_CONTENT }))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                rate_limit::<InMemoryAuthRepository, RecordingEmailGateway, MemoryRateLimitStore>,
            ))
            .with_state(state)
    }

    fn request(path: &str, ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_sixth_request_denied() {
        let app = test_router();

        for _ in 0..5 {
            let res = app.clone().oneshot(request("/ping", "10.0.0.1")).await.unwrap();
            assert_eq!(res.status(), StatusCode::NO_CONTENT);
        }

        let res = app.clone().oneshot(request("/ping", "10.0.0.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_routes_counted_separately() {
        let app = test_router();

        for _ in 0..5 {
            app.clone().oneshot(request("/ping", "10.0.0.1")).await.unwrap();
        }

        // Same IP, different route: fresh quota
        let res = app.clone().oneshot(request("/pong", "10.0.0.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_ips_counted_separately() {
        let app = test_router();

        for _ in 0..6 {
            app.clone().oneshot(request("/ping", "10.0.0.1")).await.unwrap();
        }

        let res = app.clone().oneshot(request("/ping", "10.0.0.2")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}
