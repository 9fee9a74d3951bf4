//! In-memory content source for tests and offline tooling
//!
//! [`FakeSource`] serves record maps from a map keyed by normalized page ID
//! and counts fetches, so tests can assert on caching behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{FolioError, Result};
use crate::notion::{normalize_id, ContentSource, RecordMap};

/// In-memory [`ContentSource`]
///
/// # Example
///
/// ```
/// use folio::notion::{ContentSource, FakeSource};
///
/// # #[tokio::main]
/// # async fn main() {
/// let source = FakeSource::new();
/// source.add_page("root", "Home", &[("child", "About")]);
///
/// let page = source.get_page("root").await.unwrap();
/// assert_eq!(page.pages_excluding("root").len(), 1);
/// assert_eq!(source.fetch_count(), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct FakeSource {
    pages: RwLock<HashMap<String, RecordMap>>,
    fetches: AtomicUsize,
}

impl FakeSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw record map for `page_id`
    pub fn insert(&self, page_id: &str, record_map: RecordMap) {
        if let Ok(mut pages) = self.pages.write() {
            pages.insert(normalize_id(page_id), record_map);
        }
    }

    /// Insert a page titled `title` whose record map lists `children`
    ///
    /// `children` are `(id, title)` pairs rendered as nested page blocks,
    /// followed by one text block carrying `"<title> body"`.
    pub fn add_page(&self, page_id: &str, title: &str, children: &[(&str, &str)]) {
        let mut block = serde_json::Map::new();
        block.insert(
            page_id.to_string(),
            json!({"value": {"id": page_id, "type": "page", "properties": {"title": [[title]]}}}),
        );
        for (child_id, child_title) in children {
            block.insert(
                (*child_id).to_string(),
                json!({"value": {"id": child_id, "type": "page", "properties": {"title": [[child_title]]}}}),
            );
        }
        let text_id = format!("{}-text", page_id);
        block.insert(
            text_id.clone(),
            json!({"value": {"id": text_id, "type": "text", "properties": {"title": [[format!("{} body", title)]]}}}),
        );

        self.insert(
            page_id,
            RecordMap {
                block,
                rest: serde_json::Map::new(),
            },
        );
    }

    /// Remove a page so later fetches fail
    pub fn remove(&self, page_id: &str) {
        if let Ok(mut pages) = self.pages.write() {
            pages.remove(&normalize_id(page_id));
        }
    }

    /// Number of `get_page` calls served so far, including failures
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn get_page(&self, page_id: &str) -> Result<RecordMap> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let pages = self
            .pages
            .read()
            .map_err(|_| FolioError::Content("fake source lock poisoned".to_string()))?;
        pages
            .get(&normalize_id(page_id))
            .cloned()
            .ok_or_else(|| FolioError::NotFound(format!("page {}", page_id)).into())
    }
}
