//! Redis-backed event store

use crate::error::{FolioError, Result};
use crate::events::store::{parse_entries, retain_entries};
use crate::events::{all_key, prefix_of_all_key, session_key, EventRecord, EventStore};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::OnceCell;

/// [`EventStore`] on Redis lists
///
/// The connection is opened on first use and shared by every request
/// afterwards. Appends run as one `MULTI` transaction so both lists and the
/// expiry change together.
pub struct RedisEventStore {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisEventStore {
    /// Create a store for `url` without connecting
    ///
    /// # Errors
    ///
    /// Returns error if the URL is not a valid Redis URL
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            FolioError::Config(format!("Invalid Redis URL: {}", e))
        })?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                tracing::info!("Connecting to Redis");
                self.client.get_multiplexed_async_connection().await
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to Redis: {}", e);
                FolioError::from(e)
            })?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl EventStore for RedisEventStore {
    async fn append(&self, prefix: &str, event: &EventRecord, session_ttl: Duration) -> Result<()> {
        let entry = serde_json::to_string(event)?;
        let all = all_key(prefix);
        let session = session_key(prefix, &event.session_id);
        let ttl = i64::try_from(session_ttl.as_secs()).unwrap_or(i64::MAX);

        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .lpush(&all, &entry)
            .lpush(&session, &entry)
            .expire(&session, ttl);
        let _: () = pipe.query_async(&mut conn).await.map_err(FolioError::from)?;

        tracing::debug!(prefix, session_id = %event.session_id, "Appended event");
        Ok(())
    }

    async fn recent(&self, prefix: &str, limit: usize) -> Result<Vec<EventRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = isize::try_from(limit - 1).unwrap_or(isize::MAX);

        let mut conn = self.connection().await?;
        let raw: Vec<String> = conn
            .lrange(all_key(prefix), 0, stop)
            .await
            .map_err(FolioError::from)?;
        Ok(parse_entries(&raw, prefix))
    }

    async fn prefixes(&self) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys("events:*:all").await.map_err(FolioError::from)?;

        let mut prefixes: Vec<String> = keys
            .iter()
            .filter_map(|k| prefix_of_all_key(k))
            .map(str::to_string)
            .collect();
        prefixes.sort();
        prefixes.dedup();
        Ok(prefixes)
    }

    async fn delete_sessions(&self, prefix: &str, session_ids: &[String]) -> Result<usize> {
        let mut conn = self.connection().await?;

        let session_keys: Vec<String> = session_ids
            .iter()
            .map(|sid| session_key(prefix, sid))
            .collect();
        if !session_keys.is_empty() {
            let _: () = conn.del(&session_keys).await.map_err(FolioError::from)?;
        }

        let all = all_key(prefix);
        let raw: Vec<String> = conn.lrange(&all, 0, -1).await.map_err(FolioError::from)?;
        let before = raw.len();
        let remaining = retain_entries(raw, session_ids);

        let mut pipe = redis::pipe();
        pipe.atomic().del(&all);
        if !remaining.is_empty() {
            pipe.rpush(&all, &remaining);
        }
        let _: () = pipe.query_async(&mut conn).await.map_err(FolioError::from)?;

        tracing::info!(
            prefix,
            sessions = session_ids.len(),
            removed = before - remaining.len(),
            "Deleted sessions"
        );
        Ok(session_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_url() {
        assert!(RedisEventStore::new("not a url").is_err());
    }

    #[test]
    fn test_new_does_not_connect() {
        assert!(RedisEventStore::new("redis://127.0.0.1:1/").is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let store = RedisEventStore::new("redis://127.0.0.1:1/").unwrap();
        assert!(store.recent("site", 10).await.is_err());
    }
}
