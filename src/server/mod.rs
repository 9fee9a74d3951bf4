//! HTTP API
//!
//! One axum router serves the mirrored pages, the chat endpoints, event
//! tracking, the admin API and maintenance hooks. Handlers share an
//! [`AppState`] of reference-counted services so tests can swap in fakes.

pub mod admin;
pub mod chat;
pub mod error;
pub mod maintenance;
pub mod pages;
pub mod track;
pub mod write;

pub use error::{ApiError, ApiResult};

use crate::cache::TtlCache;
use crate::chat::prompts::{persona_prompt, visitor_prompt};
use crate::chat::{GeminiGenerator, Generator};
use crate::config::Config;
use crate::content::Knowledge;
use crate::error::{FolioError, Result};
use crate::events::{EventStore, MemoryEventStore, RedisEventStore};
use crate::notion::{normalize_id, ContentSource, NotionClient, RecordMap};
use crate::slugs::SlugCache;

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Lifetime of a writing-assistant login
pub const WRITE_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Shared services behind every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub source: Arc<dyn ContentSource>,
    pub slugs: Arc<SlugCache>,
    /// Record maps keyed by normalized page ID
    pub pages: Arc<TtlCache<String, RecordMap>>,
    /// `None` when no model API key is configured
    pub generator: Option<Arc<dyn Generator>>,
    pub knowledge: Arc<Knowledge>,
    /// Visitor chat system prompt rendered from `knowledge`
    pub system_prompt: Arc<String>,
    pub events: Arc<dyn EventStore>,
    /// Writing-assistant session tokens
    pub write_sessions: Arc<TtlCache<String, ()>>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Assemble state from explicit services
    ///
    /// # Errors
    ///
    /// Returns error if the outbound HTTP client cannot be built
    pub fn new(
        config: Config,
        source: Arc<dyn ContentSource>,
        generator: Option<Arc<dyn Generator>>,
        events: Arc<dyn EventStore>,
        knowledge: Knowledge,
    ) -> Result<Self> {
        let ttl = Duration::from_secs(config.site.cache_ttl_seconds);
        let slugs = SlugCache::new(Arc::clone(&source), config.site.root_page_id.clone(), ttl);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FolioError::Config(format!("Failed to create HTTP client: {}", e)))?;
        let system_prompt = visitor_prompt(&knowledge);

        Ok(Self {
            config: Arc::new(config),
            source,
            slugs: Arc::new(slugs),
            pages: Arc::new(TtlCache::new(ttl)),
            generator,
            knowledge: Arc::new(knowledge),
            system_prompt: Arc::new(system_prompt),
            events,
            write_sessions: Arc::new(TtlCache::new(WRITE_SESSION_TTL)),
            http,
        })
    }

    /// Build production services from configuration
    ///
    /// Uses Redis for events when a URL is configured and an in-process
    /// store otherwise. Chat is disabled when no model API key is set.
    pub fn from_config(config: Config) -> Result<Self> {
        let source: Arc<dyn ContentSource> = Arc::new(NotionClient::new(&config.notion)?);

        let generator: Option<Arc<dyn Generator>> = match config.chat.api_key.as_deref() {
            Some(key) if !key.is_empty() => Some(Arc::new(GeminiGenerator::new(&config.chat)?)),
            _ => {
                tracing::warn!("No chat API key configured; chat replies will use the fallback message");
                None
            }
        };

        let events: Arc<dyn EventStore> = match config.events.redis_url.as_deref() {
            Some(url) if !url.is_empty() => Arc::new(RedisEventStore::new(url)?),
            _ => {
                tracing::warn!("No Redis URL configured; events are kept in memory only");
                Arc::new(MemoryEventStore::new())
            }
        };

        let knowledge = Knowledge::load(&config.chat.knowledge_path, persona_prompt(&config.site.name));

        Self::new(config, source, generator, events, knowledge)
    }

    /// Record map of a page, served from the page cache while fresh
    pub async fn page(&self, page_id: &str) -> Result<RecordMap> {
        let key = normalize_id(page_id);
        if let Some(map) = self.pages.get(&key) {
            tracing::debug!(page_id, "Page cache hit");
            return Ok(map);
        }
        let map = self.source.get_page(page_id).await?;
        self.pages.insert(key, map.clone());
        Ok(map)
    }

    /// Drop a page from the page cache
    pub fn evict_page(&self, page_id: &str) -> bool {
        self.pages.invalidate(&normalize_id(page_id))
    }

    /// Duration events are kept per session
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.config.events.session_ttl_seconds)
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(pages::healthz))
        .route("/sitemap.xml", get(pages::sitemap))
        .route("/api/page", get(pages::api_page))
        .route("/api/revalidate", post(maintenance::revalidate))
        .route("/api/rebuild", post(maintenance::rebuild))
        .route("/api/chat", post(chat::chat))
        .route(
            "/api/knowledge",
            get(chat::knowledge)
                .post(chat::knowledge_readonly)
                .put(chat::knowledge_readonly)
                .delete(chat::knowledge_readonly),
        )
        .route("/api/track", post(track::track))
        .route(
            "/api/messages",
            get(admin::list_messages).delete(admin::delete_messages),
        )
        .route(
            "/api/all-messages",
            get(admin::list_all_messages).delete(admin::delete_all_messages),
        )
        .route("/api/write-chat", post(write::write_chat))
        .route("/", get(pages::root_page))
        .route("/*path", get(pages::page_by_path))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    })
    .await?;

    Ok(())
}
