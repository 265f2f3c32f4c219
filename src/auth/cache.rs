//! Verification Cache
//! Mission: Memoize successful token verifications until they expire

use crate::auth::models::Claims;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Cache of verified claims keyed by the raw token string.
///
/// Purely a verification-cost optimization, never a source of truth: a miss
/// means "verify again", never "invalid". Entries are evicted lazily on read,
/// proactively when the size cap is hit, and in bulk by the periodic sweep.
pub struct VerificationCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

struct CacheEntry {
    claims: Claims,
    expires_at: usize,
}

impl VerificationCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Returns claims only while the cached expiry is still in the future.
    /// A stale hit is evicted on the spot and reported as a miss.
    pub fn get(&self, token: &str) -> Option<Claims> {
        let now = Utc::now().timestamp() as usize;
        let mut entries = self.entries.lock();

        match entries.get(token) {
            Some(entry) if entry.expires_at > now => Some(entry.claims.clone()),
            Some(_) => {
                entries.remove(token);
                None
            }
            None => None,
        }
    }

    /// Unconditional insert/overwrite. At the size cap the entry closest to
    /// expiry is dropped first.
    pub fn put(&self, token: &str, claims: Claims) {
        let mut entries = self.entries.lock();

        if entries.len() >= self.max_entries && !entries.contains_key(token) {
            let soonest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = soonest {
                entries.remove(&key);
            }
        }

        entries.insert(
            token.to_string(),
            CacheEntry {
                expires_at: claims.exp,
                claims,
            },
        );
    }

    /// Explicit removal; called whenever a token is revoked so a blacklisted
    /// token can never be served from cache.
    pub fn invalidate(&self, token: &str) {
        self.entries.lock().remove(token);
    }

    /// Drop every expired entry (call from a background task).
    pub fn sweep(&self) {
        let now = Utc::now().timestamp() as usize;
        self.entries.lock().retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for VerificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
