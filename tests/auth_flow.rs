//! Integration tests for the full session lifecycle.
//!
//! Drives the gateway end to end against temp-file SQLite stores: login
//! issuance, authenticated requests, refresh rotation with replay rejection,
//! and revocation precedence over cached verifications.

use std::sync::Arc;
use std::time::Duration;

use authgate_backend::auth::{
    error::AuthError,
    gateway::AuthGateway,
    jwt::TokenService,
    models::{AuthUser, UserRole},
    revocation::RevocationStore,
    session_store::SessionStore,
    user_store::UserStore,
    VerificationCache,
};
use tempfile::NamedTempFile;

struct TestEnv {
    gateway: AuthGateway,
    users: Arc<UserStore>,
    sessions: Arc<SessionStore>,
    _db: NamedTempFile,
}

fn setup() -> TestEnv {
    let db = NamedTempFile::new().unwrap();
    let db_path = db.path().to_str().unwrap();

    let users = Arc::new(UserStore::new(db_path).unwrap());
    let sessions = Arc::new(SessionStore::new(db_path).unwrap());

    let tokens = TokenService::with_lifetimes(
        "integration-access-secret".to_string(),
        900,
        "integration-refresh-secret".to_string(),
        604_800,
    );

    let gateway = AuthGateway::new(
        tokens,
        VerificationCache::default(),
        RevocationStore::new(Duration::from_secs(604_800)),
        sessions.clone(),
        users.clone(),
    );

    TestEnv {
        gateway,
        users,
        sessions,
        _db: db,
    }
}

fn create_subscriber(env: &TestEnv) -> AuthUser {
    env.users
        .create_user("subscriber@example.com", "password123", UserRole::Subscriber)
        .unwrap()
}

#[test]
fn full_session_lifecycle() {
    let env = setup();
    let user = create_subscriber(&env);

    // Login: pair issued, session stored
    let pair = env
        .gateway
        .issue_session(&user, UserRole::Subscriber)
        .unwrap();
    assert!(env.sessions.compare(user.id, &pair.refresh_token).unwrap());

    // Authenticated request round-trips the signed claims
    let claims = env.gateway.authenticate(&pair.access_token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.email, "subscriber@example.com");
    assert_eq!(claims.role, UserRole::Subscriber);
    assert!(claims.verified);

    // Refresh rotation succeeds and supersedes the old refresh token
    let rotated = env.gateway.rotate(&pair.refresh_token).unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);
    assert!(env
        .sessions
        .compare(user.id, &rotated.refresh_token)
        .unwrap());

    // Replay of the rotated-out token fails even though its signature is valid
    assert!(matches!(
        env.gateway.rotate(&pair.refresh_token),
        Err(AuthError::SessionMismatch)
    ));

    // Logout: revocation wins over the warm cache, session is gone
    env.gateway
        .revoke(&rotated.access_token, user.id)
        .unwrap();
    assert!(matches!(
        env.gateway.authenticate(&rotated.access_token),
        Err(AuthError::Revoked)
    ));
    assert!(env.sessions.get(user.id).unwrap().is_none());

    // The revoked refresh token can no longer mint new pairs
    assert!(matches!(
        env.gateway.rotate(&rotated.refresh_token),
        Err(AuthError::SessionMismatch)
    ));
}

#[test]
fn login_elsewhere_invalidates_first_device() {
    let env = setup();
    let user = create_subscriber(&env);

    let device_a = env
        .gateway
        .issue_session(&user, UserRole::Subscriber)
        .unwrap();
    let device_b = env
        .gateway
        .issue_session(&user, UserRole::Subscriber)
        .unwrap();

    // Device A's refresh token was unconditionally replaced
    assert!(matches!(
        env.gateway.rotate(&device_a.refresh_token),
        Err(AuthError::SessionMismatch)
    ));

    // Device B rotates normally
    env.gateway.rotate(&device_b.refresh_token).unwrap();
}

#[test]
fn rotation_picks_up_role_changes() {
    let env = setup();
    let user = create_subscriber(&env);

    let pair = env
        .gateway
        .issue_session(&user, UserRole::Subscriber)
        .unwrap();

    // Promote the user between issuance and refresh
    let conn = rusqlite::Connection::open(env._db.path()).unwrap();
    conn.execute(
        "UPDATE roles SET role = 'editor' WHERE user_id = ?1",
        rusqlite::params![user.id],
    )
    .unwrap();

    let rotated = env.gateway.rotate(&pair.refresh_token).unwrap();
    let claims = env.gateway.authenticate(&rotated.access_token).unwrap();
    assert_eq!(claims.role, UserRole::Editor);
}

#[test]
fn revocation_and_cache_invalidation_are_idempotent() {
    let env = setup();
    let user = create_subscriber(&env);

    let pair = env
        .gateway
        .issue_session(&user, UserRole::Subscriber)
        .unwrap();
    env.gateway.authenticate(&pair.access_token).unwrap();

    env.gateway.revoke(&pair.access_token, user.id).unwrap();
    env.gateway.revoke(&pair.access_token, user.id).unwrap();

    assert!(matches!(
        env.gateway.authenticate(&pair.access_token),
        Err(AuthError::Revoked)
    ));
}

#[test]
fn foreign_tokens_are_rejected() {
    let env = setup();
    let user = create_subscriber(&env);
    env.gateway
        .issue_session(&user, UserRole::Subscriber)
        .unwrap();

    // A pair minted by a different deployment (different secrets)
    let foreign = TokenService::with_lifetimes(
        "other-access-secret".to_string(),
        900,
        "other-refresh-secret".to_string(),
        604_800,
    );
    let forged = foreign.issue_pair(&user, UserRole::SuperAdmin).unwrap();

    assert!(matches!(
        env.gateway.authenticate(&forged.access_token),
        Err(AuthError::InvalidSignature)
    ));
    assert!(matches!(
        env.gateway.rotate(&forged.refresh_token),
        Err(AuthError::InvalidSignature)
    ));
}
