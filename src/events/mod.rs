//! Visitor event log
//!
//! Page views and chat messages are appended to two lists per application
//! prefix `P`:
//!
//! - `events:P:all` holds every event, newest first
//! - `events:P:session:<id>` holds one session's events and expires after the
//!   configured session TTL
//!
//! Entries are JSON [`EventRecord`]s. The admin API reads them back and
//! groups them into sessions with [`group_sessions`].

pub mod redis_store;
pub mod sessions;
pub mod store;

pub use redis_store::RedisEventStore;
pub use sessions::{group_sessions, SessionView, SessionsReport};
pub use store::{EventStore, MemoryEventStore};

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PageView,
    ChatMessage,
}

impl EventKind {
    /// Parse the wire name (`page_view`, `chat_message`)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "page_view" => Some(Self::PageView),
            "chat_message" => Some(Self::ChatMessage),
            _ => None,
        }
    }
}

/// One logged visitor event
///
/// Serialized in camelCase; absent optional fields are omitted. `prefix` is
/// never written: it is filled in from the list an event was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub session_id: String,
    #[serde(rename = "eventType")]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl EventRecord {
    /// A page view at `path`
    pub fn page_view(session_id: impl Into<String>, path: Option<String>, title: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            kind: EventKind::PageView,
            timestamp: Utc::now(),
            path,
            title,
            content: None,
            ip: None,
            user_agent: None,
            prefix: None,
        }
    }

    /// A chat message sent by the visitor
    pub fn chat_message(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            kind: EventKind::ChatMessage,
            timestamp: Utc::now(),
            path: None,
            title: None,
            content: Some(content.into()),
            ip: None,
            user_agent: None,
            prefix: None,
        }
    }

    /// Attach the caller's address and user agent
    pub fn with_client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip = ip;
        self.user_agent = user_agent;
        self
    }

    /// Override the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Key of the list holding every event of `prefix`
pub fn all_key(prefix: &str) -> String {
    format!("events:{}:all", prefix)
}

/// Key of the list holding one session's events
pub fn session_key(prefix: &str, session_id: &str) -> String {
    format!("events:{}:session:{}", prefix, session_id)
}

/// Prefix encoded in an `events:P:all` key
pub fn prefix_of_all_key(key: &str) -> Option<&str> {
    key.strip_prefix("events:")?
        .strip_suffix(":all")
        .filter(|p| !p.is_empty())
}

/// Address of the client that made a request
///
/// The first entry of `x-forwarded-for` wins over the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
}

/// `User-Agent` header, when present and valid UTF-8
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
