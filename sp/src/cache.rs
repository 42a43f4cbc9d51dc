//! Selection/extraction cache
//!
//! Two independent TTL stores keyed by a fingerprint of the normalized
//! request text, scoped to the resolved template. Model and context are left
//! out of the key, so a judgment made for one model is reused for every other.
//!
//! There is no cross-call locking: two calls for the same fingerprint may
//! both miss and both compute; the last `set` wins.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::debug;

use crate::compose::{SelectionResult, Variables};

/// Lowercase, trim and collapse runs of whitespace
pub fn normalize_request(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable hex SHA-256 of the normalized request text
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_request(text).as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint scoped to a second component (e.g. the selected prompt id)
pub fn scoped_fingerprint(text: &str, scope: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_request(text).as_bytes());
    hasher.update([0u8]);
    hasher.update(scope.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// One TTL-bound namespace
#[derive(Debug)]
pub struct TtlStore<V> {
    ttl: Duration,
    max_entries: Option<usize>,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            max_entries: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Bound the store; over the bound, expired entries go first, then the soonest to expire
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max.max(1));
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Value for `key`, or `None` when absent or expired
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                debug!(%key, "TtlStore::get: expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value`, replacing whatever was there
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();
        let mut entries = self.lock();
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );

        let Some(max) = self.max_entries else {
            return;
        };
        if entries.len() > max {
            entries.retain(|_, e| e.expires_at > now);
            while entries.len() > max {
                let Some(oldest) = entries.iter().min_by_key(|(_, e)| e.expires_at).map(|(k, _)| k.clone()) else {
                    break;
                };
                entries.remove(&oldest);
            }
        }
    }

    /// Drop expired entries, returning how many went
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    /// Live and not-yet-purged entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// The selection and variables namespaces together
#[derive(Debug)]
pub struct PromptCache {
    pub selection: TtlStore<SelectionResult>,
    pub variables: TtlStore<Variables>,
}

impl PromptCache {
    pub fn new(ttl: Duration) -> Self {
        debug!(?ttl, "PromptCache::new: called");
        Self {
            selection: TtlStore::new(ttl),
            variables: TtlStore::new(ttl),
        }
    }

    pub fn with_max_entries(self, max: usize) -> Self {
        Self {
            selection: self.selection.with_max_entries(max),
            variables: self.variables.with_max_entries(max),
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.selection.purge_expired() + self.variables.purge_expired()
    }

    pub fn len(&self) -> usize {
        self.selection.len() + self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Confidence;
    use proptest::prelude::*;

    fn selection(id: &str) -> SelectionResult {
        SelectionResult {
            selected_prompt_id: id.to_string(),
            confidence: Confidence::High,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_then_expiry() {
        let store = TtlStore::new(Duration::from_secs(60));
        store.set("k", 7u32);
        assert_eq!(store.get("k"), Some(7));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("k"), Some(7));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_refreshes() {
        let store = TtlStore::new(Duration::from_secs(10));
        store.set("k", "a".to_string());
        tokio::time::advance(Duration::from_secs(8)).await;
        store.set("k", "b".to_string());
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.get("k").as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_namespaces_independent() {
        let cache = PromptCache::new(Duration::from_secs(60));
        let key = fingerprint("Set up a project");
        cache.selection.set(key.clone(), selection("default.systemPrompt"));

        assert!(cache.selection.get(&key).is_some());
        assert!(cache.variables.get(&key).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = PromptCache::new(Duration::from_secs(5));
        cache.selection.set("a", selection("default.systemPrompt"));
        cache.variables.set("b", Variables::new());
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.variables.set("c", Variables::new());

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_entries_drops_soonest_expiring() {
        let store = TtlStore::new(Duration::from_secs(100)).with_max_entries(2);
        store.set("first", 1);
        tokio::time::advance(Duration::from_secs(1)).await;
        store.set("second", 2);
        tokio::time::advance(Duration::from_secs(1)).await;
        store.set("third", 3);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("first"), None);
        assert_eq!(store.get("third"), Some(3));
    }

    #[test]
    fn test_fingerprint_ignores_case_and_spacing() {
        assert_eq!(fingerprint("  Fix the\n\tBUG  "), fingerprint("fix the bug"));
        assert_ne!(fingerprint("fix the bug"), fingerprint("fix a bug"));
        assert_eq!(fingerprint("x").len(), 64);
    }

    #[test]
    fn test_scoped_fingerprint_differs_by_scope() {
        let a = scoped_fingerprint("req", "default.systemPrompt");
        let b = scoped_fingerprint("req", "testing.default.systemPrompt");
        assert_ne!(a, b);
        assert_ne!(a, fingerprint("req"));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(text in "[ \\ta-zA-Z0-9\\n]{0,40}") {
            let once = normalize_request(&text);
            prop_assert_eq!(normalize_request(&once), once.clone());
            prop_assert_eq!(fingerprint(&text), fingerprint(&once));
        }

        #[test]
        fn extra_whitespace_never_changes_fingerprint(words in prop::collection::vec("[a-z]{1,8}", 1..6)) {
            let tight = words.join(" ");
            let loose = format!("  {}\n", words.join("   \t"));
            prop_assert_eq!(fingerprint(&tight), fingerprint(&loose));
        }
    }
}
