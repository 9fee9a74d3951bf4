//! Notion record map types
//!
//! A record map is the payload the Notion page API returns for one page:
//! every block reachable from the page, keyed by block ID. Only the fields
//! Folio reads are typed; everything else is carried through untouched so the
//! page endpoint can hand the full map to a front-end renderer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Strip hyphens from a Notion ID
///
/// Notion IDs appear both as hyphenated UUIDs and as 32 hex characters.
/// Every comparison between IDs goes through this function.
///
/// # Examples
///
/// ```
/// use folio::notion::normalize_id;
///
/// assert_eq!(
///     normalize_id("1a7e021d-4ed2-42e1-ab76-9b9e92308bb0"),
///     "1a7e021d4ed242e1ab769b9e92308bb0"
/// );
/// ```
pub fn normalize_id(id: &str) -> String {
    id.chars().filter(|c| *c != '-').collect::<String>().to_lowercase()
}

/// Format a Notion ID as a hyphenated UUID (8-4-4-4-12)
///
/// Returns the input unchanged when it is not 32 hex characters once
/// hyphens are removed.
pub fn hyphenate_id(id: &str) -> String {
    let clean = normalize_id(id);
    if clean.len() != 32 || !clean.chars().all(|c| c.is_ascii_hexdigit()) {
        return id.to_string();
    }
    format!(
        "{}-{}-{}-{}-{}",
        &clean[0..8],
        &clean[8..12],
        &clean[12..16],
        &clean[16..20],
        &clean[20..32]
    )
}

/// Block payload of one page as returned by the Notion API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMap {
    /// Block records keyed by block ID, in response order
    #[serde(default)]
    pub block: Map<String, Value>,

    /// Collections, users, and other tables passed through untouched
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Typed view over one block record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Block {
    /// Block ID
    #[serde(default)]
    pub id: String,

    /// Block type (`page`, `text`, `header`, ...)
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Rich-text properties (`title`, `caption`, `description`, ...)
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Block {
    /// Whether this block is a (sub)page
    pub fn is_page(&self) -> bool {
        self.kind == "page"
    }

    /// Page title: the first fragment of the `title` property
    pub fn title(&self) -> Option<&str> {
        self.properties
            .as_ref()?
            .get("title")?
            .get(0)?
            .get(0)?
            .as_str()
    }

    /// Concatenate the string fragments of a rich-text property
    ///
    /// Rich text is a list of `[text, annotations?]` segments; bare strings
    /// are accepted too. Fragments are joined with single spaces. Returns
    /// `None` when the property is missing or holds no text.
    pub fn property_text(&self, name: &str) -> Option<String> {
        let segments = self.properties.as_ref()?.get(name)?.as_array()?;
        let text = segments
            .iter()
            .filter_map(|segment| match segment {
                Value::Array(parts) => parts.first().and_then(Value::as_str),
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl RecordMap {
    /// Iterate the blocks in response order
    ///
    /// Records without a decodable `value` are skipped. A block whose
    /// payload lacks an `id` takes the record key.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.block.iter().filter_map(|(key, record)| {
            let value = record.get("value")?;
            let mut block = Block::deserialize(value).ok()?;
            if block.id.is_empty() {
                block.id = key.clone();
            }
            Some(block)
        })
    }

    /// Find a block by ID, tolerating hyphenation differences
    pub fn find_block(&self, id: &str) -> Option<Block> {
        let wanted = normalize_id(id);
        self.blocks().find(|b| normalize_id(&b.id) == wanted)
    }

    /// Title of the given page, when present in this map
    pub fn page_title(&self, page_id: &str) -> Option<String> {
        self.find_block(page_id)
            .and_then(|b| b.title().map(str::to_string))
    }

    /// Every page block in this map except `exclude_id`
    pub fn pages_excluding(&self, exclude_id: &str) -> Vec<Block> {
        let excluded = normalize_id(exclude_id);
        self.blocks()
            .filter(|b| b.is_page() && normalize_id(&b.id) != excluded)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_map() -> RecordMap {
        serde_json::from_value(json!({
            "block": {
                "aaaaaaaa-0000-0000-0000-000000000001": {
                    "role": "reader",
                    "value": {
                        "id": "aaaaaaaa-0000-0000-0000-000000000001",
                        "type": "page",
                        "properties": {"title": [["Home"]]}
                    }
                },
                "bbbbbbbb-0000-0000-0000-000000000002": {
                    "value": {
                        "id": "bbbbbbbb-0000-0000-0000-000000000002",
                        "type": "text",
                        "properties": {"title": [["Hello", [["b"]]], ["world"]]}
                    }
                },
                "cccccccc-0000-0000-0000-000000000003": {
                    "value": {
                        "type": "page",
                        "properties": {"title": [["Reading"]]}
                    }
                },
                "dddddddd-0000-0000-0000-000000000004": {"role": "none"}
            },
            "collection": {"x": {"value": {}}}
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_id_strips_hyphens_and_lowercases() {
        assert_eq!(normalize_id("AB-cd-12"), "abcd12");
    }

    #[test]
    fn test_hyphenate_id() {
        assert_eq!(
            hyphenate_id("1a7e021d4ed242e1ab769b9e92308bb0"),
            "1a7e021d-4ed2-42e1-ab76-9b9e92308bb0"
        );
        assert_eq!(hyphenate_id("not-an-id"), "not-an-id");
    }

    #[test]
    fn test_blocks_skip_records_without_value() {
        let map = sample_map();
        assert_eq!(map.blocks().count(), 3);
    }

    #[test]
    fn test_block_id_falls_back_to_key() {
        let map = sample_map();
        let block = map.find_block("cccccccc000000000000000000000003").unwrap();
        assert_eq!(block.id, "cccccccc-0000-0000-0000-000000000003");
        assert!(block.is_page());
    }

    #[test]
    fn test_page_title() {
        let map = sample_map();
        assert_eq!(
            map.page_title("aaaaaaaa000000000000000000000001").as_deref(),
            Some("Home")
        );
        assert_eq!(map.page_title("missing"), None);
    }

    #[test]
    fn test_property_text_joins_fragments() {
        let map = sample_map();
        let block = map.find_block("bbbbbbbb-0000-0000-0000-000000000002").unwrap();
        assert_eq!(block.property_text("title").as_deref(), Some("Hello world"));
        assert_eq!(block.property_text("caption"), None);
    }

    #[test]
    fn test_pages_excluding_root_keeps_order() {
        let map = sample_map();
        let pages = map.pages_excluding("aaaaaaaa-0000-0000-0000-000000000001");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title(), Some("Reading"));
    }

    #[test]
    fn test_unknown_tables_round_trip() {
        let map = sample_map();
        let value = serde_json::to_value(&map).unwrap();
        assert!(value.get("collection").is_some());
        assert!(value.get("block").is_some());
    }
}
