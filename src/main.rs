//! AuthGate - Credential-Issuance & Session-Lifecycle Gateway
//! Mission: One active session per identity, revocation that always wins

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post},
    Router,
};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, time::interval};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authgate_backend::{
    auth::{
        api as auth_api, auth_middleware, AuthGateway, AuthState, RevocationStore, SessionStore,
        TokenService, UserStore, VerificationCache,
    },
    middleware::{
        rate_limit_middleware, request_logging, RateLimitConfig, RateLimitState, RateLimiter,
    },
    models::Config,
};

const SWEEP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::from_env()?;

    info!("🚀 AuthGate starting");

    let users = Arc::new(UserStore::new(&config.database_path)?);
    let sessions = Arc::new(SessionStore::new(&config.database_path)?);

    let tokens = TokenService::with_lifetimes(
        config.access_token_secret.clone(),
        config.access_token_ttl_secs,
        config.refresh_token_secret.clone(),
        config.refresh_token_ttl_secs,
    );

    let gateway = Arc::new(AuthGateway::new(
        tokens,
        VerificationCache::default(),
        RevocationStore::new(Duration::from_secs(config.revocation_retention_secs)),
        sessions.clone(),
        users.clone(),
    ));

    info!("🔐 Auth stores initialized at: {}", config.database_path);

    let limiter = RateLimiter::new();
    let rate_limit_state = RateLimitState {
        limiter: limiter.clone(),
        config: RateLimitConfig {
            max_requests: config.rate_limit_max_requests,
            window: Duration::from_secs(config.rate_limit_window_secs),
        },
    };

    // Periodic maintenance: expired cache entries, aged-out revocations,
    // and idle rate-limit windows
    let sweep_gateway = gateway.clone();
    let sweep_limiter = limiter.clone();
    let limiter_idle = Duration::from_secs(config.rate_limit_window_secs * 2);
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            sweep_gateway.sweep_expired();
            sweep_limiter.cleanup(limiter_idle);
            debug!("Maintenance sweep completed");
        }
    });

    let auth_state = AuthState::new(gateway.clone(), users, sessions);

    // Credential endpoints are rate limited per IP
    let auth_routes = Router::new()
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/refresh", post(auth_api::refresh))
        .route_layer(axum::middleware::from_fn_with_state(
            rate_limit_state,
            rate_limit_middleware,
        ))
        .with_state(auth_state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(auth_api::logout))
        .route("/api/auth/me", get(auth_api::me))
        .route(
            "/api/admin/users",
            get(auth_api::list_users).post(auth_api::create_user),
        )
        .route("/api/admin/users/:id", delete(auth_api::delete_user))
        .route_layer(axum::middleware::from_fn_with_state(
            gateway,
            auth_middleware,
        ))
        .with_state(auth_state);

    let public_routes = Router::new().route("/health", get(health_check));

    let app = Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

async fn health_check() -> &'static str {
    "🔐 AuthGate Operational"
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the manifest directory so
    // running with --manifest-path from elsewhere still finds the .env
    let _ = dotenv();

    let manifest_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
