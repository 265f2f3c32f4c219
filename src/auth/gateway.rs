//! Auth Gateway
//! Mission: Compose token, cache, revocation, and session state into the
//! operations the HTTP boundary consumes

use crate::auth::cache::VerificationCache;
use crate::auth::error::AuthError;
use crate::auth::jwt::TokenService;
use crate::auth::models::{AuthUser, Claims, TokenPair, UserRole};
use crate::auth::revocation::RevocationStore;
use crate::auth::session_store::SessionStore;
use crate::auth::user_store::UserStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Gateway over the credential-issuance and session lifecycle.
///
/// Constructed once at process start and shared behind an `Arc`; all the
/// caches it owns have an explicit lifecycle, no module-level state.
pub struct AuthGateway {
    tokens: TokenService,
    cache: VerificationCache,
    revoked: RevocationStore,
    sessions: Arc<SessionStore>,
    users: Arc<UserStore>,
}

impl AuthGateway {
    pub fn new(
        tokens: TokenService,
        cache: VerificationCache,
        revoked: RevocationStore,
        sessions: Arc<SessionStore>,
        users: Arc<UserStore>,
    ) -> Self {
        Self {
            tokens,
            cache,
            revoked,
            sessions,
            users,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.tokens.access_ttl_secs()
    }

    /// Validate an access token presented on a request.
    ///
    /// Order matters: revocation first (it must short-circuit cache hits),
    /// then the cache, then a full verification that fills the cache. The
    /// signature check runs without holding any cache lock.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        if self.revoked.is_revoked(token) {
            warn!("Revoked token presented");
            return Err(AuthError::Revoked);
        }

        if let Some(claims) = self.cache.get(token) {
            return Ok(claims);
        }

        let claims = self.tokens.verify_access(token)?;
        self.cache.put(token, claims.clone());
        debug!(user_id = claims.sub, "Access token verified");
        Ok(claims)
    }

    /// Issue a fresh pair and make it the identity's single active session.
    pub fn issue_session(&self, user: &AuthUser, role: UserRole) -> Result<TokenPair, AuthError> {
        let pair = self.tokens.issue_pair(user, role)?;
        self.sessions.replace(user.id, &pair.refresh_token)?;
        info!(user_id = user.id, "Session issued");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair, rotating the stored session.
    ///
    /// The candidate must match the stored token exactly; a validly signed
    /// but superseded refresh token fails with `SessionMismatch`.
    pub fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let refresh_claims = self.tokens.verify_refresh(refresh_token)?;
        let user_id = refresh_claims.sub;

        if !self.sessions.compare(user_id, refresh_token)? {
            warn!(user_id, "Refresh token does not match active session");
            return Err(AuthError::SessionMismatch);
        }

        // Claims may be stale since issuance; re-fetch identity and role
        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or(AuthError::UserNotFound)?;
        let role = self.fetch_role(user_id)?;

        let pair = self.tokens.issue_pair(&user, role)?;
        self.sessions.replace(user_id, &pair.refresh_token)?;
        info!(user_id, "Session rotated");
        Ok(pair)
    }

    /// Revoke an access token and tear down the identity's session.
    ///
    /// The blacklist insert and cache invalidation are idempotent and happen
    /// first; a session-clear failure is still surfaced because a stale
    /// session row would keep a still-valid refresh token usable.
    pub fn revoke(&self, access_token: &str, user_id: i64) -> Result<(), AuthError> {
        self.revoked.add(access_token);
        self.cache.invalidate(access_token);
        self.sessions.clear(user_id)?;
        info!(user_id, "Session revoked");
        Ok(())
    }

    /// Current role for an identity, failing closed on anything outside the
    /// closed role set.
    pub fn fetch_role(&self, user_id: i64) -> Result<UserRole, AuthError> {
        let raw = self.users.role_of(user_id)?.ok_or(AuthError::UnknownRole)?;
        UserRole::from_str(&raw).ok_or(AuthError::UnknownRole)
    }

    /// Drop expired cache and revocation entries (background task).
    pub fn sweep_expired(&self) {
        self.cache.sweep();
        self.revoked.sweep();
    }
}
