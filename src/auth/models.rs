//! Authentication Models
//! Mission: Define identity, role, and token claim data structures

use serde::{Deserialize, Serialize};

/// Identity record backed by the user store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub verified: bool,
    pub created_at: String,
}

/// User roles, ordered lowest to highest privilege
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Subscriber,
    Editor,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Subscriber => "subscriber",
            UserRole::Editor => "editor",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super_admin",
        }
    }

    /// Roles outside the closed set parse to `None`; callers must fail closed.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "subscriber" => Some(UserRole::Subscriber),
            "editor" => Some(UserRole::Editor),
            "admin" => Some(UserRole::Admin),
            "super_admin" => Some(UserRole::SuperAdmin),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            UserRole::Subscriber => 0,
            UserRole::Editor => 1,
            UserRole::Admin => 2,
            UserRole::SuperAdmin => 3,
        }
    }

    /// True iff this role sits at or above `required` in the hierarchy.
    pub fn has_access(&self, required: UserRole) -> bool {
        self.rank() >= required.rank()
    }
}

/// Access token claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64, // subject (user id)
    pub email: String,
    pub verified: bool,
    pub role: UserRole,
    pub exp: usize, // expiration timestamp
    pub jti: String,
}

/// Refresh token claims carry only the identity reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: i64,
    pub exp: usize,
    pub jti: String,
}

/// Signed access/refresh pair returned at login and rotation
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64, // seconds until access token expiration
    pub role: UserRole,
    pub user: UserResponse,
}

/// Refresh request body; the token may also arrive via cookie
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// User response (sanitized)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub verified: bool,
    pub role: UserRole,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &AuthUser, role: UserRole) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            verified: user.verified,
            role,
            created_at: user.created_at.clone(),
        }
    }
}

/// Current-user response built from verified claims
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub verified: bool,
    pub role: UserRole,
}

/// User creation request (admin)
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let admin = UserRole::Admin;
        let json = serde_json::to_string(&admin).unwrap();
        assert_eq!(json, r#""admin""#);

        let role: UserRole = serde_json::from_str(r#""super_admin""#).unwrap();
        assert_eq!(role, UserRole::SuperAdmin);
    }

    #[test]
    fn test_role_string_conversion() {
        assert_eq!(UserRole::SuperAdmin.as_str(), "super_admin");
        assert_eq!(UserRole::from_str("editor"), Some(UserRole::Editor));
        assert_eq!(UserRole::from_str("ADMIN"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_str("owner"), None);
    }

    #[test]
    fn test_role_hierarchy_ordering() {
        assert!(UserRole::Admin.has_access(UserRole::Editor));
        assert!(!UserRole::Subscriber.has_access(UserRole::Admin));
        assert!(UserRole::Admin.has_access(UserRole::Admin));
        assert!(UserRole::SuperAdmin.has_access(UserRole::Subscriber));
        assert!(!UserRole::Editor.has_access(UserRole::SuperAdmin));
    }
}
