//! JWT Token Service
//! Mission: Sign and verify access/refresh tokens against disjoint secrets

use crate::auth::error::AuthError;
use crate::auth::models::{AuthUser, Claims, RefreshClaims, TokenPair, UserRole};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use uuid::Uuid;

const DEFAULT_ACCESS_TTL_SECS: i64 = 900;
const DEFAULT_REFRESH_TTL_SECS: i64 = 604_800;

/// Token service holding both signing contexts. Access and refresh tokens use
/// separate secrets so neither is ever accepted in place of the other.
pub struct TokenService {
    access_secret: String,
    access_ttl_secs: i64,
    refresh_secret: String,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(access_secret: String, refresh_secret: String) -> Self {
        Self {
            access_secret,
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_secret,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        }
    }

    /// Construct with explicit lifetimes (seconds). Tests pass negative TTLs
    /// to mint already-expired tokens without sleeping.
    pub fn with_lifetimes(
        access_secret: String,
        access_ttl_secs: i64,
        refresh_secret: String,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access_secret,
            access_ttl_secs,
            refresh_secret,
            refresh_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Sign full claims with the access secret.
    pub fn sign_access(&self, user: &AuthUser, role: UserRole) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            verified: user.verified,
            role,
            exp: expiry_timestamp(self.access_ttl_secs)?,
            jti: Uuid::new_v4().to_string(),
        };

        debug!(user_id = user.id, "Signing access token");
        sign(&claims, &self.access_secret)
    }

    /// Sign the minimal refresh payload with the refresh secret.
    pub fn sign_refresh(&self, user_id: i64) -> Result<String, AuthError> {
        let claims = RefreshClaims {
            sub: user_id,
            exp: expiry_timestamp(self.refresh_ttl_secs)?,
            jti: Uuid::new_v4().to_string(),
        };

        debug!(user_id, "Signing refresh token");
        sign(&claims, &self.refresh_secret)
    }

    /// Issue an access/refresh pair for a login or rotation.
    pub fn issue_pair(&self, user: &AuthUser, role: UserRole) -> Result<TokenPair, AuthError> {
        let access_token = self.sign_access(user, role)?;
        let refresh_token = self.sign_refresh(user.id)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        verify(token, &self.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        verify(token, &self.refresh_secret)
    }
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Signing);
    }

    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::Signing)
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Zero leeway keeps the expiry boundary exact
    validation.leeway = 0;

    let decoded = decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(classify)?;

    Ok(decoded.claims)
}

/// Map jsonwebtoken failures onto the taxonomy. Callers react differently to
/// each kind, so they are never collapsed.
fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::ImmatureSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    }
}

fn expiry_timestamp(ttl_secs: i64) -> Result<usize, AuthError> {
    let expires_at = Utc::now()
        .checked_add_signed(chrono::Duration::seconds(ttl_secs))
        .ok_or(AuthError::Signing)?;
    Ok(expires_at.timestamp() as usize)
}
