//! Authentication Middleware
//! Mission: Attach verified claims to requests before protected handlers run

use crate::auth::error::AuthError;
use crate::auth::gateway::AuthGateway;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Middleware that authenticates every request through the gateway and
/// inserts the verified claims into request extensions.
pub async fn auth_middleware(
    State(gateway): State<Arc<AuthGateway>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = token_from_request(&jar, req.headers()).ok_or(AuthError::MissingToken)?;

    let claims = gateway.authenticate(&token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Token from the access cookie, falling back to a Bearer header.
pub fn token_from_request(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}
