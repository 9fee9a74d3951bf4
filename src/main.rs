//! Folio - personal website backend
//!
#![doc = "Folio - personal website backend"]
#![doc = "Main entry point for the folio server and maintenance commands."]

use anyhow::Result;

use folio::cli::{Cli, Commands};
use folio::commands;
use folio::config::Config;
use folio::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Initialize logging before validation so config problems are reported
    init_logging(&config.logging)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting HTTP server");
            commands::serve(config).await?;
            Ok(())
        }
        Commands::Slugs { json } => {
            tracing::info!("Deriving slug table");
            commands::print_slugs(config, json).await?;
            Ok(())
        }
        Commands::Sitemap => {
            tracing::info!("Rendering sitemap");
            commands::print_sitemap(config).await?;
            Ok(())
        }
        Commands::GenerateContent { output } => {
            tracing::info!("Generating chat knowledge file");
            commands::generate_content(config, output).await?;
            Ok(())
        }
    }
}
