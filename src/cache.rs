//! Time-bounded memoization
//!
//! Small in-process caches with a fixed time-to-live. Nothing is persisted;
//! a restart starts cold.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Key-value cache whose entries expire `ttl` after insertion
///
/// Expired entries are ignored on read and replaced on the next insert.
///
/// # Examples
///
/// ```
/// use folio::cache::TtlCache;
/// use std::time::Duration;
///
/// let cache = TtlCache::new(Duration::from_secs(60));
/// cache.insert("home", 1);
/// assert_eq!(cache.get(&"home"), Some(1));
/// cache.invalidate(&"home");
/// assert_eq!(cache.get(&"home"), None);
/// ```
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, (V, Instant)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return a clone of the entry if it is still fresh
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let (value, inserted_at) = entries.get(key)?;
        if inserted_at.elapsed() < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    /// Insert or replace an entry, resetting its age
    pub fn insert(&self, key: K, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            let ttl = self.ttl;
            entries.retain(|_, (_, inserted_at)| inserted_at.elapsed() < ttl);
            entries.insert(key, (value, Instant::now()));
        }
    }

    /// Drop one entry; returns whether it was present
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache stores no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
