//! Session Store
//! Mission: Persist the single active refresh token per identity

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::debug;

/// One row per identity
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: i64,
    pub refresh_token: String,
    pub updated_at: String,
}

/// Session storage with SQLite backend. `replace` is the enforcement point of
/// the single-active-session invariant: logging in elsewhere overwrites the
/// prior refresh token unconditionally.
pub struct SessionStore {
    db_path: String,
}

impl SessionStore {
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
            "CREATE TABLE IF NOT EXISTS sessions (
                user_id INTEGER PRIMARY KEY,
                refresh_token TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub fn get(&self, user_id: i64) -> Result<Option<SessionRecord>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT user_id, refresh_token, updated_at FROM sessions WHERE user_id = ?1",
        )?;

        let record = stmt.query_row(params![user_id], |row| {
            Ok(SessionRecord {
                user_id: row.get(0)?,
                refresh_token: row.get(1)?,
                updated_at: row.get(2)?,
            })
        });

        match record {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Upsert: insert if absent, otherwise overwrite the stored token.
    pub fn replace(&self, user_id: i64, refresh_token: &str) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "INSERT INTO sessions (user_id, refresh_token, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 refresh_token = excluded.refresh_token,
                 updated_at = excluded.updated_at",
            params![user_id, refresh_token, Utc::now().to_rfc3339()],
        )
        .context("Failed to replace session")?;

        debug!(user_id, "Session replaced");
        Ok(())
    }

    /// Exact match against the stored token. A validly signed but superseded
    /// refresh token must compare false.
    pub fn compare(&self, user_id: i64, candidate: &str) -> Result<bool> {
        Ok(self
            .get(user_id)?
            .map_or(false, |session| session.refresh_token == candidate))
    }

    pub fn clear(&self, user_id: i64) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])
            .context("Failed to clear session")?;

        debug!(user_id, "Session cleared");
        Ok(())
    }
}
