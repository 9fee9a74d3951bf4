//! Slug derivation and page path mapping
//!
//! Notion pages are identified by opaque IDs. This module turns the page tree
//! under the site root into stable, human-readable hierarchical paths
//! (`reading/strategy-playing-to-win`) and answers lookups in both directions.
//!
//! The pipeline is:
//!
//! 1. [`crawl_page_tree`] walks the tree once and records each page with its
//!    parent, in discovery order.
//! 2. [`build_mappings`] slugifies titles, prefixes parent paths, and
//!    disambiguates collisions with numeric suffixes.
//! 3. [`SlugTable`] indexes the result; [`SlugCache`] memoizes it for a
//!    short time-to-live.

pub mod crawl;
pub mod sitemap;

pub use crawl::{crawl_page_tree, PageNode};
pub use sitemap::render_sitemap;

use crate::notion::{normalize_id, ContentSource};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Title recorded for pages that carry no title property
pub const UNTITLED_TITLE: &str = "untitled";

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("valid slug regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid slug regex"))
}

fn hyphen_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("valid slug regex"))
}

/// Turn a page title into a URL path segment
///
/// Lower-cases, drops everything except ASCII letters, digits, `_`,
/// whitespace and hyphens, turns whitespace runs into a single hyphen, and
/// collapses repeated hyphens. Leading and trailing hyphens are kept, and a
/// title with nothing sluggable yields an empty segment.
///
/// # Examples
///
/// ```
/// use folio::slugs::slugify;
///
/// assert_eq!(slugify("My Trip"), "my-trip");
/// assert_eq!(slugify("Strategy: Playing to Win!"), "strategy-playing-to-win");
/// assert_eq!(slugify("Café Crème"), "caf-crme");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned = disallowed_chars().replace_all(&lowered, "");
    let hyphenated = whitespace_runs().replace_all(&cleaned, "-");
    hyphen_runs().replace_all(&hyphenated, "-").into_owned()
}

/// Derived path of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugMapping {
    /// Full hierarchical path without leading slash
    pub slug: String,
    /// Notion page ID, as discovered
    pub page_id: String,
    /// Page title
    pub title: String,
    /// Path of the parent page; `None` for top-level pages
    pub parent_slug: Option<String>,
}

/// Build unique hierarchical paths for crawled pages
///
/// Nodes are processed in order. A page's path is its parent's path plus
/// its own slug; pages whose parent is absent from `nodes` (the site root)
/// are top-level. When a path is taken, the last segment becomes
/// `slug-1`, `slug-2`, ... until unique, so the outcome depends only on the
/// titles and their order.
///
/// # Examples
///
/// ```
/// use folio::slugs::{build_mappings, PageNode};
///
/// let nodes: Vec<PageNode> = ["a", "b", "c"]
///     .iter()
///     .map(|id| PageNode::new(*id, "My Trip", None))
///     .collect();
/// let slugs: Vec<String> = build_mappings(&nodes).into_iter().map(|m| m.slug).collect();
/// assert_eq!(slugs, vec!["my-trip", "my-trip-1", "my-trip-2"]);
/// ```
pub fn build_mappings(nodes: &[PageNode]) -> Vec<SlugMapping> {
    let index: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (normalize_id(&node.page_id), i))
        .collect();

    let mut builder = PathBuilder {
        nodes,
        index: &index,
        paths: HashMap::new(),
        used: HashSet::new(),
        in_progress: HashSet::new(),
    };

    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let slug = builder.path_of(i);
            let parent_slug = node
                .parent_id
                .as_deref()
                .and_then(|p| index.get(&normalize_id(p)).copied())
                .map(|p| builder.path_of(p));
            SlugMapping {
                slug,
                page_id: node.page_id.clone(),
                title: node.title.clone(),
                parent_slug,
            }
        })
        .collect()
}

struct PathBuilder<'a> {
    nodes: &'a [PageNode],
    index: &'a HashMap<String, usize>,
    paths: HashMap<usize, String>,
    used: HashSet<String>,
    in_progress: HashSet<usize>,
}

impl PathBuilder<'_> {
    fn path_of(&mut self, i: usize) -> String {
        if let Some(path) = self.paths.get(&i) {
            return path.clone();
        }

        let node = &self.nodes[i];
        let base = slugify(&node.title);

        self.in_progress.insert(i);
        let parent_path = node
            .parent_id
            .as_deref()
            .and_then(|p| self.index.get(&normalize_id(p)).copied())
            .filter(|p| !self.in_progress.contains(p))
            .map(|p| self.path_of(p));
        self.in_progress.remove(&i);

        let prefix = parent_path.map(|p| format!("{}/", p)).unwrap_or_default();
        let mut unique = format!("{}{}", prefix, base);
        let mut counter = 1;
        while self.used.contains(&unique) {
            unique = format!("{}{}-{}", prefix, base, counter);
            counter += 1;
        }

        self.used.insert(unique.clone());
        self.paths.insert(i, unique.clone());
        unique
    }
}

/// Bidirectional index over slug mappings
#[derive(Debug, Clone, Default)]
pub struct SlugTable {
    mappings: Vec<SlugMapping>,
    by_slug: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl SlugTable {
    /// Index a list of mappings
    pub fn from_mappings(mappings: Vec<SlugMapping>) -> Self {
        let by_slug = mappings
            .iter()
            .enumerate()
            .map(|(i, m)| (m.slug.clone(), i))
            .collect();
        let by_id = mappings
            .iter()
            .enumerate()
            .map(|(i, m)| (normalize_id(&m.page_id), i))
            .collect();
        Self {
            mappings,
            by_slug,
            by_id,
        }
    }

    /// All mappings in discovery order
    pub fn mappings(&self) -> &[SlugMapping] {
        &self.mappings
    }

    /// Number of mapped pages
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether no page is mapped
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Mapping for a path; leading and trailing slashes are ignored
    pub fn by_slug(&self, slug: &str) -> Option<&SlugMapping> {
        self.by_slug
            .get(slug.trim_matches('/'))
            .map(|&i| &self.mappings[i])
    }

    /// Mapping for a page ID, hyphenated or not
    pub fn by_page_id(&self, page_id: &str) -> Option<&SlugMapping> {
        self.by_id
            .get(&normalize_id(page_id))
            .map(|&i| &self.mappings[i])
    }

    /// Page ID served at `slug`
    pub fn page_id_for(&self, slug: &str) -> Option<&str> {
        self.by_slug(slug).map(|m| m.page_id.as_str())
    }

    /// Path of `page_id`
    pub fn slug_for(&self, page_id: &str) -> Option<&str> {
        self.by_page_id(page_id).map(|m| m.slug.as_str())
    }
}

/// Memoized slug table with a time-to-live
///
/// The first caller after expiry crawls the tree; concurrent callers wait for
/// that crawl instead of starting their own. An empty result (root page
/// unreachable) is returned but not cached.
pub struct SlugCache {
    source: Arc<dyn ContentSource>,
    root_id: String,
    ttl: Duration,
    cached: RwLock<Option<(Arc<SlugTable>, Instant)>>,
    refresh: tokio::sync::Mutex<()>,
}

impl SlugCache {
    /// Create an empty cache over `source` rooted at `root_id`
    pub fn new(source: Arc<dyn ContentSource>, root_id: impl Into<String>, ttl: Duration) -> Self {
        Self {
            source,
            root_id: root_id.into(),
            ttl,
            cached: RwLock::new(None),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    /// Root page ID
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    fn fresh(&self) -> Option<Arc<SlugTable>> {
        let cached = self.cached.read().ok()?;
        let (table, built_at) = cached.as_ref()?;
        if built_at.elapsed() < self.ttl {
            Some(Arc::clone(table))
        } else {
            None
        }
    }

    /// Current slug table, crawling when the cached one is stale
    pub async fn table(&self) -> Arc<SlugTable> {
        if let Some(table) = self.fresh() {
            tracing::debug!("Using cached slug table");
            return table;
        }

        let _guard = self.refresh.lock().await;
        if let Some(table) = self.fresh() {
            return table;
        }

        tracing::info!(root = %self.root_id, "Crawling page tree to derive slugs");
        let nodes = crawl_page_tree(self.source.as_ref(), &self.root_id).await;
        let table = Arc::new(SlugTable::from_mappings(build_mappings(&nodes)));

        if table.is_empty() {
            tracing::warn!("Page tree crawl found no pages; not caching");
        } else if let Ok(mut cached) = self.cached.write() {
            *cached = Some((Arc::clone(&table), Instant::now()));
            tracing::info!(
                pages = table.len(),
                ttl_secs = self.ttl.as_secs(),
                "Cached slug table"
            );
        }

        table
    }

    /// Force the next [`SlugCache::table`] call to crawl again
    pub fn invalidate(&self) {
        if let Ok(mut cached) = self.cached.write() {
            *cached = None;
            tracing::debug!("Slug table invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::FakeSource;

    fn node(id: &str, title: &str, parent: Option<&str>) -> PageNode {
        PageNode::new(id, title, parent)
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Google Cardboard"), "google-cardboard");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("What's new? (2024)"), "whats-new-2024");
        assert_eq!(slugify("C++ & Rust"), "c-rust");
    }

    #[test]
    fn test_slugify_collapses_hyphens_and_whitespace() {
        assert_eq!(slugify("a  -  b"), "a-b");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_slugify_drops_non_ascii_letters() {
        assert_eq!(slugify("Café Crème"), "caf-crme");
        assert_eq!(slugify("Été 2024"), "t-2024");
    }

    #[test]
    fn test_slugify_keeps_edge_hyphens() {
        assert_eq!(slugify(" - Notes"), "-notes");
        assert_eq!(slugify("Notes "), "notes-");
    }

    #[test]
    fn test_slugify_nothing_sluggable_is_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("My Trip"), slugify("My Trip"));
    }

    #[test]
    fn test_sibling_collisions_get_suffixes() {
        let nodes = vec![
            node("p", "Travel", None),
            node("a", "My Trip", Some("p")),
            node("b", "My Trip", Some("p")),
            node("c", "My Trip", Some("p")),
        ];
        let slugs: Vec<String> = build_mappings(&nodes).into_iter().map(|m| m.slug).collect();
        assert_eq!(
            slugs,
            vec![
                "travel",
                "travel/my-trip",
                "travel/my-trip-1",
                "travel/my-trip-2"
            ]
        );
    }

    #[test]
    fn test_same_title_under_different_parents_does_not_collide() {
        let nodes = vec![
            node("p1", "Books", None),
            node("p2", "Talks", None),
            node("a", "Notes", Some("p1")),
            node("b", "Notes", Some("p2")),
        ];
        let mappings = build_mappings(&nodes);
        assert_eq!(mappings[2].slug, "books/notes");
        assert_eq!(mappings[3].slug, "talks/notes");
        assert_eq!(mappings[3].parent_slug.as_deref(), Some("talks"));
    }

    #[test]
    fn test_parent_outside_nodes_is_top_level() {
        let nodes = vec![node("a", "About", Some("root"))];
        let mappings = build_mappings(&nodes);
        assert_eq!(mappings[0].slug, "about");
        assert_eq!(mappings[0].parent_slug, None);
    }

    #[test]
    fn test_child_listed_before_parent_still_nests() {
        let nodes = vec![node("c", "Chapter", Some("b")), node("b", "Book", None)];
        let mappings = build_mappings(&nodes);
        assert_eq!(mappings[0].slug, "book/chapter");
        assert_eq!(mappings[1].slug, "book");
    }

    #[test]
    fn test_parent_cycle_is_broken() {
        let nodes = vec![node("a", "A", Some("b")), node("b", "B", Some("a"))];
        let mappings = build_mappings(&nodes);
        assert_eq!(mappings[0].slug, "b/a");
        assert_eq!(mappings[1].slug, "b");
    }

    #[test]
    fn test_parent_ids_match_across_hyphenation() {
        let nodes = vec![
            node("aaaa-bbbb", "Parent", None),
            node("c", "Child", Some("aaaabbbb")),
        ];
        assert_eq!(build_mappings(&nodes)[1].slug, "parent/child");
    }

    #[test]
    fn test_paths_are_unique() {
        let nodes = vec![
            node("a", "x", None),
            node("b", "x-1", None),
            node("c", "x", None),
            node("d", "x", None),
        ];
        let mappings = build_mappings(&nodes);
        let unique: HashSet<_> = mappings.iter().map(|m| m.slug.clone()).collect();
        assert_eq!(unique.len(), mappings.len());
        assert_eq!(mappings[2].slug, "x-2");
    }

    #[test]
    fn test_table_round_trip() {
        let nodes = vec![
            node("11806be9-9203-80a7-90e4-cd2b2bd0eb91", "Reading", None),
            node(
                "1a7e021d-4ed2-42e1-ab76-9b9e92308bb0",
                "Google Cardboard",
                Some("11806be9920380a790e4cd2b2bd0eb91"),
            ),
        ];
        let table = SlugTable::from_mappings(build_mappings(&nodes));
        for mapping in table.mappings() {
            assert_eq!(table.page_id_for(&mapping.slug), Some(mapping.page_id.as_str()));
            assert_eq!(table.slug_for(&mapping.page_id), Some(mapping.slug.as_str()));
        }
        assert_eq!(
            table.page_id_for("/reading/google-cardboard/"),
            Some("1a7e021d-4ed2-42e1-ab76-9b9e92308bb0")
        );
        assert_eq!(
            table.slug_for("1a7e021d4ed242e1ab769b9e92308bb0"),
            Some("reading/google-cardboard")
        );
        assert_eq!(table.page_id_for("nope"), None);
    }

    #[tokio::test]
    async fn test_slug_cache_serves_cached_table() {
        let source = Arc::new(FakeSource::new());
        source.add_page("root", "Home", &[("about", "About")]);
        source.add_page("about", "About", &[]);

        let cache = SlugCache::new(source.clone(), "root", Duration::from_secs(300));
        let first = cache.table().await;
        let fetches = source.fetch_count();
        let second = cache.table().await;

        assert_eq!(first.len(), 1);
        assert_eq!(second.slug_for("about"), Some("about"));
        assert_eq!(source.fetch_count(), fetches);
    }

    #[tokio::test]
    async fn test_slug_cache_invalidate_recrawls() {
        let source = Arc::new(FakeSource::new());
        source.add_page("root", "Home", &[("about", "About")]);

        let cache = SlugCache::new(source.clone(), "root", Duration::from_secs(300));
        cache.table().await;
        source.add_page("root", "Home", &[("about", "About"), ("blog", "Blog")]);
        assert_eq!(cache.table().await.len(), 1);

        cache.invalidate();
        assert_eq!(cache.table().await.len(), 2);
    }

    #[tokio::test]
    async fn test_slug_cache_does_not_cache_empty_table() {
        let source = Arc::new(FakeSource::new());
        let cache = SlugCache::new(source.clone(), "root", Duration::from_secs(300));
        assert!(cache.table().await.is_empty());

        source.add_page("root", "Home", &[("about", "About")]);
        assert_eq!(cache.table().await.len(), 1);
    }
}
