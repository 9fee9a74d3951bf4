//! Notion content source
//!
//! Pages are authored in Notion and mirrored read-only. This module defines
//! the [`ContentSource`] abstraction, the HTTP client that talks to the
//! Notion page API, and an in-memory source used by tests and tooling.

pub mod fake;
pub mod types;

pub use fake::FakeSource;
pub use types::{hyphenate_id, normalize_id, Block, RecordMap};

use crate::config::NotionConfig;
use crate::error::{FolioError, Result};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Source of page record maps
///
/// Implementations must be cheap to share across request handlers.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the record map of one page
    ///
    /// # Errors
    ///
    /// Returns error if the page does not exist or the source is unreachable
    async fn get_page(&self, page_id: &str) -> Result<RecordMap>;
}

/// HTTP client for the Notion page API
///
/// Uses the same `loadPageChunk` call the public Notion web client makes,
/// which needs no integration token for pages shared to the web.
///
/// # Examples
///
/// ```no_run
/// use folio::config::NotionConfig;
/// use folio::notion::{ContentSource, NotionClient};
///
/// # async fn example() -> folio::error::Result<()> {
/// let client = NotionClient::new(&NotionConfig::default())?;
/// let page = client.get_page("1a7e021d-4ed2-42e1-ab76-9b9e92308bb0").await?;
/// println!("{} blocks", page.block.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    api_base: String,
    chunk_limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadPageChunkRequest {
    page_id: String,
    limit: u32,
    cursor: ChunkCursor,
    chunk_number: u32,
    vertical_columns: bool,
}

#[derive(Debug, Serialize)]
struct ChunkCursor {
    stack: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadPageChunkResponse {
    record_map: RecordMap,
}

impl NotionClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &NotionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FolioError::Content(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Notion client: api_base={}", config.api_base);

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            chunk_limit: config.chunk_limit,
        })
    }
}

#[async_trait]
impl ContentSource for NotionClient {
    async fn get_page(&self, page_id: &str) -> Result<RecordMap> {
        let url = format!("{}/loadPageChunk", self.api_base);
        let request = LoadPageChunkRequest {
            page_id: hyphenate_id(page_id),
            limit: self.chunk_limit,
            cursor: ChunkCursor { stack: Vec::new() },
            chunk_number: 0,
            vertical_columns: false,
        };

        tracing::debug!(page_id = %request.page_id, "Fetching Notion page");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Notion request failed: {}", e);
                FolioError::Content(format!("Notion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(page_id, "Notion returned error {}: {}", status, error_text);
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FolioError::NotFound(format!("page {}", page_id)).into());
            }
            return Err(FolioError::Content(format!(
                "Notion returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: LoadPageChunkResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Notion response: {}", e);
            FolioError::Content(format!("Failed to parse Notion response: {}", e))
        })?;

        if body.record_map.find_block(page_id).is_none() {
            return Err(FolioError::NotFound(format!("page {}", page_id)).into());
        }

        tracing::debug!(
            page_id,
            blocks = body.record_map.block.len(),
            "Fetched Notion page"
        );
        Ok(body.record_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = NotionConfig {
            api_base: "http://localhost:9999/api/v3/".to_string(),
            ..NotionConfig::default()
        };
        let client = NotionClient::new(&config).unwrap();
        assert_eq!(client.api_base, "http://localhost:9999/api/v3");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = LoadPageChunkRequest {
            page_id: "abc".to_string(),
            limit: 100,
            cursor: ChunkCursor { stack: Vec::new() },
            chunk_number: 0,
            vertical_columns: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["pageId"], "abc");
        assert_eq!(value["chunkNumber"], 0);
        assert_eq!(value["verticalColumns"], false);
        assert!(value["cursor"]["stack"].as_array().unwrap().is_empty());
    }
}
