//! Chat with a hosted language model
//!
//! Visitor questions are forwarded to a text generator together with a system
//! prompt built from the site's own pages. Replies may carry markers the
//! server acts on:
//!
//! - `[NAVIGATE:Title](url)` asks the front-end to go to a page
//! - `<<<DRAFT_START>>> ... <<<DRAFT_END>>>` replaces the writing draft

pub mod fake;
pub mod gemini;
pub mod markers;
pub mod prompts;

pub use fake::ScriptedGenerator;
pub use gemini::GeminiGenerator;
pub use markers::{extract_draft, split_navigation, Navigation};

use crate::error::Result;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One conversation turn, as sent by the front-end
///
/// Turns are never stored; only the visitor's last message may be logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a visitor turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Text generator behind the chat endpoints
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce the next assistant reply
    ///
    /// # Errors
    ///
    /// Returns error if the model cannot be reached or returns no text
    async fn generate(&self, system: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// Last turn of the conversation when it was written by the visitor
pub fn last_user_message(messages: &[ChatMessage]) -> Option<&ChatMessage> {
    messages.last().filter(|m| m.role == ChatRole::User)
}
