//! Folio - personal website backend with Notion as a headless CMS
//!
//! This library mirrors Notion pages to stable hierarchical URLs, answers
//! visitor questions with a hosted language model grounded in the site's own
//! text, and records page views and chat messages for review.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `notion`: Content source abstraction and the Notion page client
//! - `slugs`: Page tree crawl, slug derivation, and the cached slug table
//! - `content`: Page text extraction and the chat knowledge base
//! - `chat`: Text generator abstraction, Gemini client, and reply markers
//! - `events`: Event records, Redis and in-memory stores, session grouping
//! - `server`: Axum router and handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use folio::server::{build_router, AppState};
//! use folio::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let router = build_router(AppState::from_config(config)?);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod logging;
pub mod notion;
pub mod server;
pub mod slugs;

// Re-export commonly used types
pub use config::Config;
pub use error::{FolioError, Result};
