//! Configuration management for Folio
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Folio
///
/// Holds everything the site backend needs: the Notion root page, the
/// text generation provider, the event store, admin secrets, and the
/// HTTP server and logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site identity and URL behavior
    #[serde(default)]
    pub site: SiteConfig,
    /// Notion content source
    #[serde(default)]
    pub notion: NotionConfig,
    /// Chat widget and text generation provider
    #[serde(default)]
    pub chat: ChatConfig,
    /// Visit and chat event logging
    #[serde(default)]
    pub events: EventsConfig,
    /// Secrets gating admin and maintenance endpoints
    #[serde(default)]
    pub admin: AdminConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Site identity and URL behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Notion ID of the page served at `/`
    #[serde(default)]
    pub root_page_id: String,

    /// Public base URL, used for the sitemap
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Display name of the site owner
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Serve pages at `/<page-id>` instead of derived slugs
    ///
    /// Skips the slow page tree crawl, which is convenient during local
    /// development.
    #[serde(default)]
    pub page_id_urls: bool,

    /// Path redirects applied before slug resolution
    #[serde(default)]
    pub redirects: Vec<Redirect>,

    /// How long derived slug tables and fetched pages stay cached (seconds)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

/// A single path redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    /// Request path, with leading slash
    pub source: String,
    /// Target path or URL
    pub destination: String,
    /// Permanent (308) instead of temporary (307)
    #[serde(default)]
    pub permanent: bool,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_site_name() -> String {
    "Folio".to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root_page_id: String::new(),
            base_url: default_base_url(),
            name: default_site_name(),
            page_id_urls: false,
            redirects: Vec::new(),
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

/// Notion content source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Base URL of the Notion page API
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,

    /// Request timeout (seconds)
    #[serde(default = "default_notion_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of blocks requested per page
    #[serde(default = "default_notion_chunk_limit")]
    pub chunk_limit: u32,
}

fn default_notion_api_base() -> String {
    "https://www.notion.so/api/v3".to_string()
}

fn default_notion_timeout() -> u64 {
    30
}

fn default_notion_chunk_limit() -> u32 {
    100
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_base: default_notion_api_base(),
            timeout_seconds: default_notion_timeout(),
            chunk_limit: default_notion_chunk_limit(),
        }
    }
}

/// Chat widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the Generative Language API
    #[serde(default = "default_chat_api_base")]
    pub api_base: String,

    /// Model used for replies
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key; requests without one fail and the fallback reply is sent
    #[serde(default)]
    pub api_key: Option<String>,

    /// Knowledge file written by `folio generate-content`
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: PathBuf,

    /// Reply shown to the visitor when generation fails
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    /// Request timeout (seconds)
    #[serde(default = "default_chat_timeout")]
    pub timeout_seconds: u64,
}

fn default_chat_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_chat_model() -> String {
    "gemini-flash-latest".to_string()
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("public/page-content.json")
}

fn default_fallback_reply() -> String {
    "Sorry, I couldn't answer that right now. Please try again in a moment.".to_string()
}

fn default_chat_timeout() -> u64 {
    60
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: default_chat_api_base(),
            model: default_chat_model(),
            api_key: None,
            knowledge_path: default_knowledge_path(),
            fallback_reply: default_fallback_reply(),
            timeout_seconds: default_chat_timeout(),
        }
    }
}

/// Event logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Redis connection URL; an in-memory store is used when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Application prefix namespacing the event keys
    #[serde(default = "default_events_prefix")]
    pub prefix: String,

    /// Record page views posted to `/api/track`
    #[serde(default)]
    pub page_logging: bool,

    /// Record visitor chat messages
    #[serde(default)]
    pub chat_logging: bool,

    /// Expiry of per-session event lists (seconds)
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
}

fn default_events_prefix() -> String {
    "folio".to_string()
}

fn default_session_ttl() -> u64 {
    60 * 60 * 24 * 30
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            prefix: default_events_prefix(),
            page_logging: false,
            chat_logging: false,
            session_ttl_seconds: default_session_ttl(),
        }
    }
}

/// Secrets gating admin and maintenance endpoints
///
/// An unset secret disables the endpoint it guards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Bearer password for the event review endpoints
    #[serde(default)]
    pub password: Option<String>,

    /// Password for the writing assistant
    #[serde(default)]
    pub write_password: Option<String>,

    /// Secret for `/api/revalidate`
    #[serde(default)]
    pub revalidate_secret: Option<String>,

    /// Token for `/api/rebuild`
    #[serde(default)]
    pub rebuild_token: Option<String>,

    /// Deployment webhook called by `/api/rebuild`
    #[serde(default)]
    pub deploy_hook_url: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,

    /// Also append logs to this file
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "folio=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FolioError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| FolioError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Some(root) = env_string(&["FOLIO_ROOT_PAGE_ID", "NOTION_PAGE_ID"]) {
            self.site.root_page_id = root;
        }
        if let Some(base_url) = env_string(&["FOLIO_SITE_URL", "SITE_URL"]) {
            self.site.base_url = base_url;
        }
        if let Some(v) = env_bool("FOLIO_PAGE_ID_URLS") {
            self.site.page_id_urls = v;
        }

        if let Some(api_base) = env_string(&["FOLIO_NOTION_API_BASE"]) {
            self.notion.api_base = api_base;
        }

        if let Some(key) = env_string(&["FOLIO_GEMINI_API_KEY", "GEMINI_API_KEY"]) {
            self.chat.api_key = Some(key);
        }
        if let Some(model) = env_string(&["FOLIO_CHAT_MODEL"]) {
            self.chat.model = model;
        }
        if let Some(path) = env_string(&["FOLIO_KNOWLEDGE_PATH"]) {
            self.chat.knowledge_path = PathBuf::from(path);
        }

        if let Some(url) = env_string(&["FOLIO_REDIS_URL", "REDIS_URL"]) {
            self.events.redis_url = Some(url);
        }
        if let Some(prefix) = env_string(&["FOLIO_EVENTS_PREFIX"]) {
            self.events.prefix = prefix;
        }
        if let Some(v) = env_bool("ENABLE_PAGE_LOGGING") {
            self.events.page_logging = v;
        }
        if let Some(v) = env_bool("ENABLE_CHAT_LOGGING") {
            self.events.chat_logging = v;
        }

        if let Some(pw) = env_string(&["FOLIO_ADMIN_PASSWORD", "ADMIN_PASSWORD"]) {
            self.admin.password = Some(pw);
        }
        if let Some(pw) = env_string(&["FOLIO_WRITE_PASSWORD", "WRITE_PASSWORD"]) {
            self.admin.write_password = Some(pw);
        }
        if let Some(secret) = env_string(&["FOLIO_REVALIDATE_SECRET", "REVALIDATE_SECRET"]) {
            self.admin.revalidate_secret = Some(secret);
        }
        if let Some(token) = env_string(&["FOLIO_REBUILD_TOKEN", "REBUILD_SECRET_TOKEN"]) {
            self.admin.rebuild_token = Some(token);
        }
        if let Some(url) = env_string(&["FOLIO_DEPLOY_HOOK_URL", "DEPLOY_HOOK_URL"]) {
            self.admin.deploy_hook_url = Some(url);
        }

        if let Some(bind) = env_string(&["FOLIO_BIND"]) {
            self.server.bind = bind;
        }
        if let Some(v) = env_bool("FOLIO_JSON_LOGS") {
            self.logging.json_format = v;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "folio=debug".to_string();
        }
        if let crate::cli::Commands::Serve { bind: Some(bind) } = &cli.command {
            self.server.bind = bind.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.site.root_page_id.trim().is_empty() {
            return Err(FolioError::Config("site.root_page_id cannot be empty".to_string()).into());
        }

        url::Url::parse(&self.site.base_url).map_err(|e| {
            FolioError::Config(format!("site.base_url is not a valid URL: {}", e))
        })?;

        for redirect in &self.site.redirects {
            if !redirect.source.starts_with('/') {
                return Err(FolioError::Config(format!(
                    "redirect source must start with '/': {}",
                    redirect.source
                ))
                .into());
            }
        }

        if self.site.cache_ttl_seconds == 0 {
            return Err(FolioError::Config(
                "site.cache_ttl_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.notion.timeout_seconds == 0 || self.chat.timeout_seconds == 0 {
            return Err(
                FolioError::Config("timeouts must be greater than 0".to_string()).into(),
            );
        }

        if self.events.prefix.is_empty() || self.events.prefix.contains(':') {
            return Err(FolioError::Config(
                "events.prefix must be non-empty and must not contain ':'".to_string(),
            )
            .into());
        }

        if self.chat.model.is_empty() {
            return Err(FolioError::Config("chat.model cannot be empty".to_string()).into());
        }

        Ok(())
    }
}

/// Read the first set, non-empty variable among `names`, trimmed
fn env_string(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        other => {
            tracing::warn!("Invalid boolean for {}: {}", name, other);
            None
        }
    }
}
