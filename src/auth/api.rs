//! Authentication API Endpoints
//! Mission: Provide login, refresh, logout, and user management endpoints

use crate::auth::{
    error::AuthError,
    gateway::AuthGateway,
    middleware::{token_from_request, ACCESS_COOKIE, REFRESH_COOKIE},
    models::{
        Claims, CreateUserRequest, LoginRequest, LoginResponse, MeResponse, RefreshRequest,
        RefreshResponse, TokenPair, UserResponse, UserRole,
    },
    session_store::SessionStore,
    user_store::UserStore,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub gateway: Arc<AuthGateway>,
    pub users: Arc<UserStore>,
    pub sessions: Arc<SessionStore>,
}

impl AuthState {
    pub fn new(
        gateway: Arc<AuthGateway>,
        users: Arc<UserStore>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            gateway,
            users,
            sessions,
        }
    }
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthError> {
    info!("🔐 Login attempt: {}", payload.email);

    let valid = state.users.verify_password(&payload.email, &payload.password)?;
    if !valid {
        warn!("❌ Failed login attempt: {}", payload.email);
        return Err(AuthError::InvalidCredentials);
    }

    let user = state
        .users
        .find_by_email(&payload.email)?
        .ok_or(AuthError::InvalidCredentials)?;

    // Unverified accounts are indistinguishable from bad credentials
    if !user.verified {
        return Err(AuthError::InvalidCredentials);
    }

    let role = state.gateway.fetch_role(user.id)?;
    let pair = state.gateway.issue_session(&user, role)?;

    info!("✅ Login successful: {} ({})", user.email, role.as_str());

    let response = LoginResponse {
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
        expires_in: state.gateway.access_ttl_secs(),
        role,
        user: UserResponse::from_user(&user, role),
    };

    Ok((set_session_cookies(jar, &pair), Json(response)))
}

/// Refresh endpoint - POST /api/auth/refresh
///
/// The refresh token may arrive via cookie or request body.
pub async fn refresh(
    State(state): State<AuthState>,
    jar: CookieJar,
    payload: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<RefreshResponse>), AuthError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| payload.and_then(|Json(body)| body.refresh_token))
        .ok_or(AuthError::MissingToken)?;

    let pair = state.gateway.rotate(&token)?;

    let response = RefreshResponse {
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
        expires_in: state.gateway.access_ttl_secs(),
    };

    Ok((set_session_cookies(jar, &pair), Json(response)))
}

/// Logout endpoint - POST /api/auth/logout (authenticated)
pub async fn logout(
    State(state): State<AuthState>,
    jar: CookieJar,
    headers: HeaderMap,
    Extension(claims): Extension<Claims>,
) -> Result<(CookieJar, Json<Value>), AuthError> {
    let token = token_from_request(&jar, &headers).ok_or(AuthError::MissingToken)?;

    state.gateway.revoke(&token, claims.sub)?;

    info!("👋 Logout: {}", claims.email);

    Ok((
        clear_session_cookies(jar),
        Json(json!({ "message": "Logout successful" })),
    ))
}

/// Current user info - GET /api/auth/me
///
/// Built from the verified claims; no database lookup needed.
pub async fn me(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    Json(MeResponse {
        id: claims.sub,
        email: claims.email,
        verified: claims.verified,
        role: claims.role,
    })
}

/// List all users - GET /api/admin/users (admin and up)
pub async fn list_users(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    require_access(&claims, UserRole::Admin)?;

    let users = state.users.list_users()?;
    let response = users
        .iter()
        .filter_map(|user| match state.gateway.fetch_role(user.id) {
            Ok(role) => Some(UserResponse::from_user(user, role)),
            Err(_) => {
                warn!(user_id = user.id, "Skipping user with unknown role");
                None
            }
        })
        .collect();

    Ok(Json(response))
}

/// Create user - POST /api/admin/users (admin and up)
pub async fn create_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    require_access(&claims, UserRole::Admin)?;

    if payload.password.len() < 8 {
        return Err(AuthError::WeakPassword);
    }

    let user = state
        .users
        .create_user(&payload.email, &payload.password, payload.role)
        .map_err(|e| {
            warn!("Failed to create user: {}", e);
            AuthError::UserExists
        })?;

    Ok(Json(UserResponse::from_user(&user, payload.role)))
}

/// Delete user - DELETE /api/admin/users/:id (admin and up)
pub async fn delete_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AuthError> {
    require_access(&claims, UserRole::Admin)?;

    if user_id == claims.sub {
        return Err(AuthError::Forbidden);
    }

    state
        .users
        .delete_user(user_id)
        .map_err(|_| AuthError::UserNotFound)?;

    // Account removal also tears down any live session
    state.sessions.clear(user_id)?;

    Ok(StatusCode::NO_CONTENT)
}

fn require_access(claims: &Claims, required: UserRole) -> Result<(), AuthError> {
    if claims.role.has_access(required) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

fn set_session_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, pair.access_token.clone()))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh_token.clone()))
}

fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(session_cookie(ACCESS_COOKIE, String::new()))
        .remove(session_cookie(REFRESH_COOKIE, String::new()))
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}
