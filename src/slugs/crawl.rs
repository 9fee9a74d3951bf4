//! Page tree discovery

use crate::notion::{normalize_id, ContentSource};

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One page found while walking the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    /// Page ID as it appeared in the record map
    pub page_id: String,
    /// Page title, `untitled` when the block has none
    pub title: String,
    /// Page whose record map first listed this one; `None` for top-level
    /// pages built outside a crawl
    pub parent_id: Option<String>,
}

impl PageNode {
    /// Create a node
    pub fn new(page_id: impl Into<String>, title: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            page_id: page_id.into(),
            title: title.into(),
            parent_id: parent_id.map(str::to_string),
        }
    }
}

/// Walk the page tree under `root_id`, fetching every page once
///
/// Every page block other than the root is recorded the first time it is
/// seen, with the page being fetched as its parent. Pages are fetched in
/// discovery order: the earliest-discovered page not yet fetched goes next.
/// A page that fails to load is logged and skipped; pages already
/// discovered stay in the result.
///
/// Returns nodes in discovery order. The root is never included.
pub async fn crawl_page_tree(source: &dyn ContentSource, root_id: &str) -> Vec<PageNode> {
    let mut nodes: Vec<PageNode> = Vec::new();
    let mut known: HashSet<String> = HashSet::new();
    let mut processed: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::from([root_id.to_string()]);

    while let Some(page_id) = queue.pop_front() {
        let clean = normalize_id(&page_id);
        if !processed.insert(clean.clone()) {
            continue;
        }

        let record_map = match source.get_page(&page_id).await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(page_id = %page_id, "Failed to fetch page while crawling: {}", e);
                continue;
            }
        };

        let before = nodes.len();
        for block in record_map.pages_excluding(root_id) {
            if !known.insert(normalize_id(&block.id)) {
                continue;
            }
            let title = block.title().unwrap_or(super::UNTITLED_TITLE).to_string();
            queue.push_back(block.id.clone());
            nodes.push(PageNode {
                page_id: block.id,
                title,
                parent_id: Some(clean.clone()),
            });
        }

        tracing::debug!(
            page_id = %page_id,
            discovered = nodes.len() - before,
            "Crawled page"
        );
    }

    tracing::info!(pages = nodes.len(), "Page tree crawl complete");
    nodes
}
