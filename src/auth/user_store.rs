//! User Storage
//! Mission: Securely store identities and role assignments with SQLite

use crate::auth::models::{AuthUser, UserRole};
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{info, warn};

/// Identity/role storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                verified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS roles (
                user_id INTEGER PRIMARY KEY,
                role TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.create_default_admin(&conn)?;

        Ok(())
    }

    /// Create default super_admin for initial setup
    fn create_default_admin(&self, conn: &Connection) -> Result<()> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM roles WHERE role IN ('admin', 'super_admin')",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count == 0 {
            let password_hash =
                hash("admin123", DEFAULT_COST).context("Failed to hash password")?;

            conn.execute(
                "INSERT INTO users (email, password_hash, verified, created_at)
                 VALUES (?1, ?2, 1, ?3)",
                params!["admin@localhost", password_hash, Utc::now().to_rfc3339()],
            )
            .context("Failed to insert admin user")?;

            let user_id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO roles (user_id, role) VALUES (?1, ?2)",
                params![user_id, UserRole::SuperAdmin.as_str()],
            )
            .context("Failed to insert admin role")?;

            info!("🔐 Default admin user created (email: admin@localhost, password: admin123)");
            warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }

        Ok(())
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, verified, created_at
             FROM users WHERE email = ?1",
        )?;

        let user = stmt.query_row(params![email], map_user_row);

        match user {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_by_id(&self, user_id: i64) -> Result<Option<AuthUser>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, verified, created_at
             FROM users WHERE id = ?1",
        )?;

        let user = stmt.query_row(params![user_id], map_user_row);

        match user {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify email and password
    pub fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        match self.find_by_email(email)? {
            Some(user) => {
                let valid =
                    verify(password, &user.password_hash).context("Failed to verify password")?;
                Ok(valid)
            }
            None => Ok(false),
        }
    }

    /// Create a new user with a role assignment
    pub fn create_user(&self, email: &str, password: &str, role: UserRole) -> Result<AuthUser> {
        let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;
        let created_at = Utc::now().to_rfc3339();

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO users (email, password_hash, verified, created_at)
             VALUES (?1, ?2, 1, ?3)",
            params![email, password_hash, created_at],
        )
        .context("Failed to insert user")?;

        let user_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO roles (user_id, role) VALUES (?1, ?2)",
            params![user_id, role.as_str()],
        )
        .context("Failed to insert role")?;

        info!("✅ Created user: {} ({})", email, role.as_str());

        Ok(AuthUser {
            id: user_id,
            email: email.to_string(),
            password_hash,
            verified: true,
            created_at,
        })
    }

    /// Raw role string for an identity. Callers parse with
    /// `UserRole::from_str` and fail closed on anything unknown.
    pub fn role_of(&self, user_id: i64) -> Result<Option<String>> {
        let conn = Connection::open(&self.db_path)?;

        let role = conn.query_row(
            "SELECT role FROM roles WHERE user_id = ?1",
            params![user_id],
            |row| row.get::<_, String>(0),
        );

        match role {
            Ok(role) => Ok(Some(role)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all users (admin only)
    pub fn list_users(&self) -> Result<Vec<AuthUser>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn
            .prepare("SELECT id, email, password_hash, verified, created_at FROM users")?;

        let users = stmt
            .query_map([], map_user_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Delete a user and its role row (admin only)
    pub fn delete_user(&self, user_id: i64) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;

        if rows_affected == 0 {
            anyhow::bail!("User not found");
        }

        conn.execute("DELETE FROM roles WHERE user_id = ?1", params![user_id])?;

        info!("🗑️  Deleted user: {}", user_id);
        Ok(())
    }
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuthUser> {
    Ok(AuthUser {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        verified: row.get::<_, i64>(3)? != 0,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = UserStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_default_admin_created() {
        let (store, _temp) = create_test_store();

        let admin = store.find_by_email("admin@localhost").unwrap().unwrap();
        assert!(admin.verified);

        let role = store.role_of(admin.id).unwrap().unwrap();
        assert_eq!(UserRole::from_str(&role), Some(UserRole::SuperAdmin));
    }

    #[test]
    fn test_password_verification() {
        let (store, _temp) = create_test_store();

        assert!(store.verify_password("admin@localhost", "admin123").unwrap());
        assert!(!store
            .verify_password("admin@localhost", "wrongpassword")
            .unwrap());
        assert!(!store.verify_password("nobody@localhost", "password").unwrap());
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("editor@example.com", "password123", UserRole::Editor)
            .unwrap();
        assert_eq!(user.email, "editor@example.com");

        let retrieved = store.find_by_email("editor@example.com").unwrap().unwrap();
        assert_eq!(retrieved.id, user.id);

        let role = store.role_of(user.id).unwrap().unwrap();
        assert_eq!(UserRole::from_str(&role), Some(UserRole::Editor));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, _temp) = create_test_store();

        store
            .create_user("dup@example.com", "pass12345", UserRole::Subscriber)
            .unwrap();
        assert!(store
            .create_user("dup@example.com", "pass12345", UserRole::Subscriber)
            .is_err());
    }

    #[test]
    fn test_unknown_role_string_fails_closed() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("odd@example.com", "pass12345", UserRole::Subscriber)
            .unwrap();

        // Simulate a role row written by something outside the closed set
        let conn = Connection::open(&store.db_path).unwrap();
        conn.execute(
            "UPDATE roles SET role = 'owner' WHERE user_id = ?1",
            params![user.id],
        )
        .unwrap();

        let raw = store.role_of(user.id).unwrap().unwrap();
        assert_eq!(UserRole::from_str(&raw), None);
    }

    #[test]
    fn test_list_and_delete_users() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("temp@example.com", "pass12345", UserRole::Subscriber)
            .unwrap();
        assert_eq!(store.list_users().unwrap().len(), 2); // default admin + temp

        store.delete_user(user.id).unwrap();
        assert!(store.find_by_id(user.id).unwrap().is_none());
        assert!(store.role_of(user.id).unwrap().is_none());
        assert!(store.delete_user(user.id).is_err());
    }
}
