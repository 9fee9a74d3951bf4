//! Reply markers understood by the front-end

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Opening marker of a draft block
pub const DRAFT_START: &str = "<<<DRAFT_START>>>";

/// Closing marker of a draft block
pub const DRAFT_END: &str = "<<<DRAFT_END>>>";

/// Page the assistant wants to take the visitor to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub url: String,
    pub page_title: String,
}

fn navigate_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[NAVIGATE:([^\]]+)\]\(([^)]+)\)").expect("valid navigation regex")
    })
}

fn draft_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<<<DRAFT_START>>>(.*)<<<DRAFT_END>>>").expect("valid draft regex")
    })
}

/// Split a navigation marker out of a reply
///
/// The first `[NAVIGATE:Title](url)` is replaced with
/// `Taking you to Title...`. Replies without a marker come back unchanged.
///
/// # Examples
///
/// ```
/// use folio::chat::split_navigation;
///
/// let (text, nav) = split_navigation("Sure! [NAVIGATE:Google Cardboard](/reading/cardboard)");
/// assert_eq!(text, "Sure! Taking you to Google Cardboard...");
/// assert_eq!(nav.unwrap().url, "/reading/cardboard");
///
/// let (text, nav) = split_navigation("No marker here");
/// assert_eq!(text, "No marker here");
/// assert!(nav.is_none());
/// ```
pub fn split_navigation(reply: &str) -> (String, Option<Navigation>) {
    let Some(caps) = navigate_pattern().captures(reply) else {
        return (reply.to_string(), None);
    };

    let page_title = caps[1].to_string();
    let url = caps[2].to_string();
    let message = navigate_pattern()
        .replacen(reply, 1, regex::NoExpand(&format!("Taking you to {}...", page_title)))
        .into_owned();

    (message, Some(Navigation { url, page_title }))
}

/// Text between the draft markers, trimmed
///
/// Spans lines. When the markers occur more than once the outermost pair
/// wins. Returns `None` when there is no marker pair or nothing between it.
pub fn extract_draft(reply: &str) -> Option<String> {
    let caps = draft_pattern().captures(reply)?;
    let inner = caps.get(1)?.as_str();
    if inner.is_empty() {
        None
    } else {
        Some(inner.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_marker_in_middle() {
        let (text, nav) = split_navigation("Here: [NAVIGATE:About](/about) enjoy");
        assert_eq!(text, "Here: Taking you to About... enjoy");
        assert_eq!(
            nav,
            Some(Navigation {
                url: "/about".to_string(),
                page_title: "About".to_string()
            })
        );
    }

    #[test]
    fn test_navigation_serializes_snake_case_title() {
        let (_, nav) = split_navigation("[NAVIGATE:About](/about)");
        let value = serde_json::to_value(nav.unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"url": "/about", "page_title": "About"}));
    }

    #[test]
    fn test_only_first_marker_is_replaced() {
        let (text, nav) = split_navigation("[NAVIGATE:A](/a) [NAVIGATE:B](/b)");
        assert_eq!(text, "Taking you to A... [NAVIGATE:B](/b)");
        assert_eq!(nav.unwrap().page_title, "A");
    }

    #[test]
    fn test_regular_markdown_link_is_not_navigation() {
        let reply = "I worked on [Google Cardboard](/reading/google-cardboard).";
        let (text, nav) = split_navigation(reply);
        assert_eq!(text, reply);
        assert!(nav.is_none());
    }

    #[test]
    fn test_title_with_dollar_sign_is_literal() {
        let (text, _) = split_navigation("[NAVIGATE:$1 Ideas](/ideas)");
        assert_eq!(text, "Taking you to $1 Ideas...");
    }

    #[test]
    fn test_extract_draft_multiline() {
        let reply = "Done:\n\n<<<DRAFT_START>>>\n# Title\n\nBody\n<<<DRAFT_END>>>\n\nAnything else?";
        assert_eq!(extract_draft(reply).as_deref(), Some("# Title\n\nBody"));
    }

    #[test]
    fn test_extract_draft_missing_or_empty() {
        assert_eq!(extract_draft("no draft"), None);
        assert_eq!(extract_draft("<<<DRAFT_START>>>only start"), None);
        assert_eq!(extract_draft("<<<DRAFT_START>>><<<DRAFT_END>>>"), None);
    }

    #[test]
    fn test_extract_draft_whitespace_only_is_empty_string() {
        assert_eq!(
            extract_draft("<<<DRAFT_START>>>  \n <<<DRAFT_END>>>").as_deref(),
            Some("")
        );
    }
}
