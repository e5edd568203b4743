//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::{AuthAppState, AuthConfig, PgAuthRepository, PgRateLimitStore};
use auth::infra::HttpEmailGateway;
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Auth configuration
    let auth_config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        // In production, load the token secret from environment
        let secret_b64 =
            env::var("TOKEN_SECRET").expect("TOKEN_SECRET must be set in production");
        let token_secret = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        AuthConfig {
            token_secret,
            ..AuthConfig::default()
        }
    };

    let repo = PgAuthRepository::new(pool.clone());
    let rate_limiter = PgRateLimitStore::new(pool.clone());

    // Startup cleanup: remove expired sessions and stale rate-limit rows
    // Errors here should not prevent server startup
    match repo.cleanup_expired_sessions().await {
        Ok(sessions) => {
            tracing::info!(sessions_deleted = sessions, "Session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
        }
    }
    match rate_limiter.cleanup_expired(&auth_config.rate_limit).await {
        Ok(rows) => {
            tracing::info!(rate_limits_deleted = rows, "Rate limit cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rate limit cleanup failed, continuing anyway");
        }
    }

    // Email gateway
    let email_endpoint = env::var("EMAIL_API_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:31125/send".to_string());
    let email_api_key = env::var("EMAIL_API_KEY").unwrap_or_default();
    let email_gateway = HttpEmailGateway::new(email_endpoint, email_api_key);

    let state = AuthAppState::new(
        Arc::new(repo),
        Arc::new(email_gateway),
        Arc::new(rate_limiter),
        auth_config,
    );

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/auth", auth::auth_router(state.clone()))
        .nest("/security", auth::security_router(state.clone()))
        .nest("/testing", auth::testing_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31113));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
