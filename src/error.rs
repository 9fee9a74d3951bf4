//! Error types for Folio
//!
//! This module defines the error types used throughout the site backend,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Folio operations
///
/// Covers configuration loading, content fetches from the CMS, text
/// generation calls, event store access, and request validation.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content source errors (page fetches, malformed record maps)
    #[error("Content error: {0}")]
    Content(String),

    /// Text generation errors (API calls, empty replies)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Event store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Missing or wrong credentials on a gated endpoint
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Requested page, slug, or session does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request payload
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Redis client errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Result type alias for Folio operations
///
/// Uses `anyhow::Error` so callers can attach context while the typed
/// `FolioError` stays recoverable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
