//! System prompts for the visitor chat and the writing assistant

use super::markers::{DRAFT_END, DRAFT_START};
use crate::content::Knowledge;

/// Persona and navigation rules for the visitor chat
///
/// `owner` is the site owner's name; the assistant speaks as them.
pub fn persona_prompt(owner: &str) -> String {
    format!(
        r#"You are the digital counterpart of {owner}. You speak in first person as {owner}, on {owner}'s personal website.

LANGUAGE:
- Always respond in the same language the visitor is using
- Keep matching the visitor's language for the whole conversation

STYLE:
- One paragraph per answer, two or three sentences at most
- Conversational and friendly; say "I", "my", "I've worked on"

Two ways to help visitors:

1. NAVIGATE when a page would answer the question better than you can:
   - Look up the URL in page_urls using the lower-cased page title
   - Reply with the special format [NAVIGATE:Page Title](url)
   - The visitor is taken to that page automatically

2. ANSWER WITH LINKS for informational questions:
   - Use regular markdown links [Display Text](url) with URLs from page_urls

Rules:
- Decide whether the visitor wants to GO somewhere or to KNOW something
- Always take URLs from page_urls; never invent one
- Always use relative URLs starting with /"#
    )
}

/// Full system prompt for the visitor chat
///
/// Persona, then the page URL mapping, then the text of every page.
pub fn visitor_prompt(knowledge: &Knowledge) -> String {
    let mut prompt = knowledge.system_prompt.clone();

    let urls = serde_json::to_string_pretty(&knowledge.page_urls).unwrap_or_else(|_| "{}".into());
    prompt.push_str("\n\npage_urls:\n");
    prompt.push_str(&urls);

    for page in &knowledge.pages {
        prompt.push_str(&format!(
            "\n\n---\npage: {} ({})\n{}",
            page.title,
            page.url(),
            page.content
        ));
    }

    prompt
}

/// System prompt for the writing assistant
///
/// Extends the visitor prompt with the current draft and the draft-marker
/// contract.
pub fn writing_prompt(knowledge: &Knowledge, current_draft: Option<&str>) -> String {
    let draft = current_draft
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("(empty)");

    format!(
        r#"{base}

---

WRITING MODE:

You are now a writing assistant helping the site owner create new content for the website.

Current draft:
{draft}

Your role:
- Brainstorm ideas for new content
- Suggest improvements to the draft and its structure
- Reference existing pages above when relevant and keep their style consistent
- Be concise and actionable; ask clarifying questions when needed

When asked to write or update the draft:
1. Include the complete updated markdown in your reply
2. Wrap it between {start} and {end}
3. Everything between the markers replaces the current draft

Example reply:
I'll write that for you:

{start}
# Introduction

Opening paragraph...
{end}

The draft now has an introduction."#,
        base = visitor_prompt(knowledge),
        draft = draft,
        start = DRAFT_START,
        end = DRAFT_END,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PageContent;

    fn knowledge() -> Knowledge {
        Knowledge::new(
            persona_prompt("Ada"),
            vec![PageContent {
                page_id: "p1".to_string(),
                slug: "projects/engine".to_string(),
                title: "Analytical Engine".to_string(),
                content: "Notes on the engine".to_string(),
            }],
        )
    }

    #[test]
    fn test_persona_names_owner_and_marker() {
        let prompt = persona_prompt("Ada");
        assert!(prompt.contains("digital counterpart of Ada"));
        assert!(prompt.contains("[NAVIGATE:Page Title](url)"));
    }

    #[test]
    fn test_visitor_prompt_includes_urls_and_pages() {
        let prompt = visitor_prompt(&knowledge());
        assert!(prompt.starts_with("You are the digital counterpart of Ada"));
        assert!(prompt.contains(r#""analytical engine": "/projects/engine""#));
        assert!(prompt.contains("Notes on the engine"));
    }

    #[test]
    fn test_writing_prompt_embeds_draft() {
        let prompt = writing_prompt(&knowledge(), Some("# My draft"));
        assert!(prompt.contains("Current draft:\n# My draft"));
        assert!(prompt.contains(DRAFT_START));
        assert!(prompt.contains(DRAFT_END));
        assert!(prompt.contains("Notes on the engine"));
    }

    #[test]
    fn test_writing_prompt_empty_draft() {
        let prompt = writing_prompt(&knowledge(), Some("   "));
        assert!(prompt.contains("Current draft:\n(empty)"));
        let prompt = writing_prompt(&knowledge(), None);
        assert!(prompt.contains("Current draft:\n(empty)"));
    }
}
