//! Event store abstraction and the in-process implementation

use crate::error::{FolioError, Result};
use crate::events::{all_key, prefix_of_all_key, session_key, EventRecord};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Append-only event log with admin reads and deletes
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event to the prefix-wide list and its session list
    ///
    /// The session list's expiry is reset to `session_ttl`.
    async fn append(&self, prefix: &str, event: &EventRecord, session_ttl: Duration) -> Result<()>;

    /// Up to `limit` most recent events of `prefix`, newest first
    ///
    /// Entries that do not parse are skipped. Each event's `prefix` is set.
    async fn recent(&self, prefix: &str, limit: usize) -> Result<Vec<EventRecord>>;

    /// Every prefix that has an event list, sorted
    async fn prefixes(&self) -> Result<Vec<String>>;

    /// Delete the given sessions' lists and their events in the prefix-wide list
    ///
    /// Returns the number of session IDs processed.
    async fn delete_sessions(&self, prefix: &str, session_ids: &[String]) -> Result<usize>;
}

/// Parse raw list entries, skipping what does not decode
pub(crate) fn parse_entries(raw: &[String], prefix: &str) -> Vec<EventRecord> {
    raw.iter()
        .filter_map(|entry| match serde_json::from_str::<EventRecord>(entry) {
            Ok(mut event) => {
                event.prefix = Some(prefix.to_string());
                Some(event)
            }
            Err(e) => {
                tracing::debug!(prefix, "Skipping unparseable event entry: {}", e);
                None
            }
        })
        .collect()
}

/// Raw entries that survive deleting `session_ids`, in their original order
///
/// Entries that are not JSON objects are dropped. Entries without a session
/// ID are kept.
pub(crate) fn retain_entries(raw: Vec<String>, session_ids: &[String]) -> Vec<String> {
    let removed: HashSet<&str> = session_ids.iter().map(String::as_str).collect();
    raw.into_iter()
        .filter(|entry| match serde_json::from_str::<serde_json::Value>(entry) {
            Ok(serde_json::Value::Object(map)) => !map
                .get("sessionId")
                .and_then(serde_json::Value::as_str)
                .is_some_and(|sid| removed.contains(sid)),
            _ => false,
        })
        .collect()
}

/// In-process [`EventStore`]
///
/// Keeps lists keyed exactly like the Redis store. Session expiry is not
/// enforced. Used when no Redis URL is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    lists: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryEventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a raw entry onto the front of a list
    pub fn push_raw(&self, key: &str, entry: impl Into<String>) {
        if let Ok(mut lists) = self.lists.lock() {
            lists.entry(key.to_string()).or_default().insert(0, entry.into());
        }
    }

    /// Raw contents of a list, front (newest) first
    pub fn raw(&self, key: &str) -> Vec<String> {
        self.lists
            .lock()
            .ok()
            .and_then(|lists| lists.get(key).cloned())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<String>>>> {
        self.lists
            .lock()
            .map_err(|_| FolioError::Store("event store lock poisoned".to_string()).into())
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, prefix: &str, event: &EventRecord, _session_ttl: Duration) -> Result<()> {
        let entry = serde_json::to_string(event)?;
        let mut lists = self.lock()?;
        lists.entry(all_key(prefix)).or_default().insert(0, entry.clone());
        lists
            .entry(session_key(prefix, &event.session_id))
            .or_default()
            .insert(0, entry);
        Ok(())
    }

    async fn recent(&self, prefix: &str, limit: usize) -> Result<Vec<EventRecord>> {
        let raw: Vec<String> = {
            let lists = self.lock()?;
            lists
                .get(&all_key(prefix))
                .map(|list| list.iter().take(limit).cloned().collect())
                .unwrap_or_default()
        };
        Ok(parse_entries(&raw, prefix))
    }

    async fn prefixes(&self) -> Result<Vec<String>> {
        let lists = self.lock()?;
        let mut prefixes: Vec<String> = lists
            .keys()
            .filter_map(|k| prefix_of_all_key(k))
            .map(str::to_string)
            .collect();
        prefixes.sort();
        prefixes.dedup();
        Ok(prefixes)
    }

    async fn delete_sessions(&self, prefix: &str, session_ids: &[String]) -> Result<usize> {
        let mut lists = self.lock()?;
        for sid in session_ids {
            lists.remove(&session_key(prefix, sid));
        }

        let key = all_key(prefix);
        let raw = lists.remove(&key).unwrap_or_default();
        let remaining = retain_entries(raw, session_ids);
        if !remaining.is_empty() {
            lists.insert(key, remaining);
        }

        tracing::info!(prefix, sessions = session_ids.len(), "Deleted sessions");
        Ok(session_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use chrono::{TimeZone, Utc};

    const TTL: Duration = Duration::from_secs(60);

    fn event(sid: &str, minute: u32) -> EventRecord {
        EventRecord::page_view(sid, Some(format!("/p{}", minute)), None)
            .at(Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap())
    }

    #[tokio::test]
    async fn test_append_writes_both_lists() {
        let store = MemoryEventStore::new();
        store.append("site", &event("a", 1), TTL).await.unwrap();
        store.append("site", &event("b", 2), TTL).await.unwrap();

        assert_eq!(store.raw("events:site:all").len(), 2);
        assert_eq!(store.raw("events:site:session:a").len(), 1);
        assert_eq!(store.raw("events:site:session:b").len(), 1);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let store = MemoryEventStore::new();
        for minute in 0..5 {
            store.append("site", &event("a", minute), TTL).await.unwrap();
        }

        let events = store.recent("site", 3).await.unwrap();
        let paths: Vec<_> = events.iter().filter_map(|e| e.path.as_deref()).collect();
        assert_eq!(paths, vec!["/p4", "/p3", "/p2"]);
        assert!(events.iter().all(|e| e.prefix.as_deref() == Some("site")));
    }

    #[tokio::test]
    async fn test_recent_skips_garbage() {
        let store = MemoryEventStore::new();
        store.append("site", &event("a", 1), TTL).await.unwrap();
        store.push_raw("events:site:all", "not json");

        let events = store.recent("site", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::PageView);
    }

    #[tokio::test]
    async fn test_prefixes_sorted() {
        let store = MemoryEventStore::new();
        store.append("zeta", &event("a", 1), TTL).await.unwrap();
        store.append("alpha", &event("a", 1), TTL).await.unwrap();
        assert_eq!(store.prefixes().await.unwrap(), vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_delete_sessions_rebuilds_all_list() {
        let store = MemoryEventStore::new();
        store.append("site", &event("a", 1), TTL).await.unwrap();
        store.append("site", &event("b", 2), TTL).await.unwrap();
        store.append("site", &event("a", 3), TTL).await.unwrap();
        store.append("site", &event("c", 4), TTL).await.unwrap();
        store.push_raw("events:site:all", "garbage");
        store.push_raw("events:site:all", r#"{"note":"no session"}"#);

        let deleted = store
            .delete_sessions("site", &["a".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(store.raw("events:site:session:a").is_empty());
        assert_eq!(store.raw("events:site:session:b").len(), 1);

        let raw = store.raw("events:site:all");
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0], r#"{"note":"no session"}"#);

        let remaining: Vec<_> = store
            .recent("site", 10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.session_id)
            .collect();
        assert_eq!(remaining, vec!["c", "b"]);
    }

    #[test]
    fn test_retain_entries_keeps_order() {
        let raw = vec![
            r#"{"sessionId":"x","n":1}"#.to_string(),
            r#"{"sessionId":"y","n":2}"#.to_string(),
            "[1,2]".to_string(),
            r#"{"sessionId":"x","n":3}"#.to_string(),
            r#"{"sessionId":"z","n":4}"#.to_string(),
        ];
        let kept = retain_entries(raw, &["x".to_string()]);
        assert_eq!(
            kept,
            vec![
                r#"{"sessionId":"y","n":2}"#.to_string(),
                r#"{"sessionId":"z","n":4}"#.to_string()
            ]
        );
    }
}
