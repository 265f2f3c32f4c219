//! Authentication Error Taxonomy
//! Mission: Keep failure kinds distinguishable for callers and the HTTP boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Every failure the gateway can produce. All variants are recoverable by the
/// caller; the gateway never retries internally.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
    #[error("token has been revoked")]
    Revoked,
    #[error("refresh token does not match the active session")]
    SessionMismatch,
    #[error("unknown role")]
    UnknownRole,
    #[error("too many requests")]
    RateLimited,
    #[error("token signing failed")]
    Signing,
    #[error("missing authorization token")]
    MissingToken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("insufficient permissions")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("email already registered")]
    UserExists,
    #[error("password must be at least 8 characters")]
    WeakPassword,
    #[error("storage failure")]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Expired
            | AuthError::InvalidSignature
            | AuthError::Malformed
            | AuthError::Revoked
            | AuthError::SessionMismatch
            | AuthError::MissingToken
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UnknownRole | AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::UserExists => StatusCode::CONFLICT,
            AuthError::WeakPassword => StatusCode::BAD_REQUEST,
            AuthError::Signing | AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Internal details never leak past the boundary
            AuthError::Storage(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        (self.status(), message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::Expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Revoked.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::SessionMismatch.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::UnknownRole.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AuthError::Signing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_error_is_opaque() {
        let err = AuthError::Storage(anyhow::anyhow!("users table is on fire"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
