//! Command-line interface definition for Folio
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the server command and the offline maintenance commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Folio - personal website backend mirroring Notion pages
#[derive(Parser, Debug, Clone)]
#[command(name = "folio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "FOLIO_CONFIG", default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Folio
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Override the listen address from config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Crawl the page tree and print the derived slug table
    Slugs {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Crawl the page tree and print the sitemap XML
    Sitemap,

    /// Extract page text into the chat knowledge file
    GenerateContent {
        /// Output path; defaults to `chat.knowledge_path`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Serve { bind: None },
        }
    }
}
