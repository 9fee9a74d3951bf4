//! Page text extraction and chat knowledge
//!
//! The chat assistant answers from the site's own text. At build time
//! [`generate_page_content`] pulls plain text out of every mapped page and
//! the result is written as JSON; at serve time [`Knowledge::load`] reads it
//! back alongside the system prompt.

use crate::error::Result;
use crate::notion::{normalize_id, ContentSource, RecordMap};
use crate::slugs::SlugTable;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Rich-text properties whose text is extracted
const TEXT_PROPERTIES: [&str; 3] = ["title", "caption", "description"];

/// Plain text of every block in a record map
///
/// Each block contributes its title, caption and description text joined
/// with spaces; non-empty block texts are joined with blank lines.
///
/// # Examples
///
/// ```
/// use folio::content::extract_text;
/// use folio::notion::RecordMap;
/// use serde_json::json;
///
/// let map: RecordMap = serde_json::from_value(json!({"block": {
///     "a": {"value": {"type": "text", "properties": {"title": [["Hello"], ["world"]]}}},
///     "b": {"value": {"type": "image", "properties": {"caption": [["A photo"]]}}}
/// }})).unwrap();
/// assert_eq!(extract_text(&map), "Hello world\n\nA photo");
/// ```
pub fn extract_text(record_map: &RecordMap) -> String {
    record_map
        .blocks()
        .filter_map(|block| {
            let text = TEXT_PROPERTIES
                .iter()
                .filter_map(|name| block.property_text(name))
                .collect::<Vec<_>>()
                .join(" ");
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extracted text of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub page_id: String,
    /// Mapped path, or `/` for the site root
    pub slug: String,
    pub title: String,
    pub content: String,
}

impl PageContent {
    /// Site-relative URL of this page
    pub fn url(&self) -> String {
        if self.slug == "/" {
            "/".to_string()
        } else {
            format!("/{}", self.slug.trim_matches('/'))
        }
    }
}

/// Extract text from the root page and every mapped page
///
/// Pages that fail to load are logged and left out.
pub async fn generate_page_content(
    source: &dyn ContentSource,
    root_id: &str,
    table: &SlugTable,
) -> Vec<PageContent> {
    let mut pages = Vec::with_capacity(table.len() + 1);
    let root = normalize_id(root_id);

    match source.get_page(root_id).await {
        Ok(map) => {
            let content = extract_text(&map);
            tracing::info!(slug = "/", chars = content.len(), "Extracted page content");
            pages.push(PageContent {
                page_id: root_id.to_string(),
                slug: "/".to_string(),
                title: table
                    .by_page_id(root_id)
                    .map(|m| m.title.clone())
                    .unwrap_or_else(|| "Home".to_string()),
                content,
            });
        }
        Err(e) => tracing::error!("Failed to extract root page content: {}", e),
    }

    for mapping in table.mappings() {
        if normalize_id(&mapping.page_id) == root {
            continue;
        }
        match source.get_page(&mapping.page_id).await {
            Ok(map) => {
                let content = extract_text(&map);
                tracing::info!(slug = %mapping.slug, chars = content.len(), "Extracted page content");
                pages.push(PageContent {
                    page_id: mapping.page_id.clone(),
                    slug: mapping.slug.clone(),
                    title: mapping.title.clone(),
                    content,
                });
            }
            Err(e) => tracing::error!(slug = %mapping.slug, "Failed to extract page content: {}", e),
        }
    }

    tracing::info!(pages = pages.len(), "Page content extraction complete");
    pages
}

/// Write extracted pages as pretty JSON, creating parent directories
pub fn write_page_content(path: &Path, pages: &[PageContent]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(pages)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// What the chat assistant knows about the site
///
/// Immutable once built; shared read-only between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Knowledge {
    /// Persona and behavior instructions
    pub system_prompt: String,
    pub pages: Vec<PageContent>,
    /// Lower-cased page title to site-relative URL
    pub page_urls: BTreeMap<String, String>,
}

impl Knowledge {
    /// Build a knowledge base from extracted pages
    pub fn new(system_prompt: impl Into<String>, pages: Vec<PageContent>) -> Self {
        let page_urls = pages
            .iter()
            .map(|page| (page.title.to_lowercase(), page.url()))
            .collect();
        Self {
            system_prompt: system_prompt.into(),
            pages,
            page_urls,
        }
    }

    /// Load page content written by `generate-content`
    ///
    /// A missing or unreadable file leaves the knowledge base with the system
    /// prompt only.
    pub fn load(path: &Path, system_prompt: impl Into<String>) -> Self {
        let pages = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Vec<PageContent>>(&text) {
                Ok(pages) => {
                    tracing::info!(path = %path.display(), pages = pages.len(), "Loaded page content");
                    pages
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), "Invalid page content file: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), "Page content file not readable: {}", e);
                Vec::new()
            }
        };
        Self::new(system_prompt, pages)
    }
}
