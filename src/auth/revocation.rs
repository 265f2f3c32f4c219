//! Revocation Store
//! Mission: Track explicitly revoked tokens for a bounded retention window

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(604_800); // 7 days

/// Time-bounded set of revoked tokens.
///
/// The retention window is independent of the token's own expiry: it only
/// needs to outlive the longest-lived token type, after which the entry is
/// irrelevant anyway. Entries age out; no explicit removal API is needed.
pub struct RevocationStore {
    entries: Mutex<HashMap<String, Instant>>,
    retention: Duration,
}

impl RevocationStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retention,
        }
    }

    pub fn add(&self, token: &str) {
        self.entries.lock().insert(token.to_string(), Instant::now());
    }

    /// O(1) membership check. Entries past retention count as absent.
    pub fn is_revoked(&self, token: &str) -> bool {
        self.entries
            .lock()
            .get(token)
            .map_or(false, |inserted_at| inserted_at.elapsed() < self.retention)
    }

    /// Drop aged-out entries (call from a background task).
    pub fn sweep(&self) {
        let retention = self.retention;
        self.entries
            .lock()
            .retain(|_, inserted_at| inserted_at.elapsed() < retention);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for RevocationStore {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_added_token_is_revoked() {
        let store = RevocationStore::default();
        store.add("token-a");

        assert!(store.is_revoked("token-a"));
        assert!(!store.is_revoked("token-b"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = RevocationStore::default();
        store.add("token-a");
        store.add("token-a");

        assert!(store.is_revoked("token-a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_entry_ages_out_after_retention() {
        let store = RevocationStore::new(Duration::from_millis(30));
        store.add("token-a");
        assert!(store.is_revoked("token-a"));

        sleep(Duration::from_millis(40));
        assert!(!store.is_revoked("token-a"));

        store.sweep();
        assert!(store.is_empty());
    }
}
