//! Scripted generator for tests and offline runs

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::chat::{ChatMessage, Generator};
use crate::error::{FolioError, Result};

/// [`Generator`] that replays queued replies
///
/// Each call pops the next reply; `Err` entries simulate model failures.
/// When the queue is empty every call fails. The system prompt and messages
/// of each call are recorded.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedGenerator {
    /// Create a generator with no queued replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that answers with `replies` in order
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for reply in replies {
            generator.push_reply(reply);
        }
        generator
    }

    /// Queue a successful reply
    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(reply.into()));
        }
    }

    /// Queue a failure
    pub fn push_error(&self, message: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(message.into()));
        }
    }

    /// System prompts and conversations received so far
    pub fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, system: &str, messages: &[ChatMessage]) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((system.to_string(), messages.to_vec()));
        }

        let next = self
            .replies
            .lock()
            .map_err(|_| FolioError::Generation("scripted generator lock poisoned".to_string()))?
            .pop_front();

        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(FolioError::Generation(message).into()),
            None => Err(FolioError::Generation("no scripted reply".to_string()).into()),
        }
    }
}
