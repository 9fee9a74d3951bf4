/*!
Command handlers for the CLI

Each subcommand maps to one function here:

- `serve`: run the HTTP API
- `slugs`: print the derived slug table
- `sitemap`: print the sitemap XML
- `generate-content`: write the chat knowledge file

The offline commands talk to Notion directly and never touch the event store.
*/

use crate::config::Config;
use crate::content::{generate_page_content, write_page_content};
use crate::error::Result;
use crate::notion::{normalize_id, ContentSource, NotionClient};
use crate::server::{self, AppState};
use crate::slugs::{build_mappings, crawl_page_tree, render_sitemap, SlugMapping, SlugTable};

use prettytable::{row, Table};
use std::path::PathBuf;

/// Run the HTTP server until interrupted
pub async fn serve(config: Config) -> Result<()> {
    let bind = config.server.bind.clone();
    tracing::info!(
        root = %config.site.root_page_id,
        page_id_urls = config.site.page_id_urls,
        "Starting server"
    );
    let state = AppState::from_config(config)?;
    server::serve(state, &bind).await
}

async fn crawl(config: &Config) -> Result<(NotionClient, SlugTable)> {
    let client = NotionClient::new(&config.notion)?;
    let nodes = crawl_page_tree(&client, &config.site.root_page_id).await;
    let table = SlugTable::from_mappings(build_mappings(&nodes));
    Ok((client, table))
}

/// Build the PATH / PAGE ID / TITLE table for `folio slugs`
pub fn slug_table(mappings: &[SlugMapping]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Path", "Page ID", "Title"]);

    for mapping in mappings {
        table.add_row(row![
            format!("/{}", mapping.slug),
            normalize_id(&mapping.page_id),
            mapping.title
        ]);
    }

    table
}

/// Crawl the page tree and print every mapping
pub async fn print_slugs(config: Config, json: bool) -> Result<()> {
    let (_, table) = crawl(&config).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(table.mappings())?);
    } else {
        println!("\nSlugs under {}:\n", config.site.root_page_id);
        slug_table(table.mappings()).printstd();
        println!("\n{} pages", table.len());
    }
    Ok(())
}

/// Crawl the page tree and print the sitemap
pub async fn print_sitemap(config: Config) -> Result<()> {
    let (_, table) = crawl(&config).await?;
    print!("{}", render_sitemap(&config.site.base_url, &table));
    Ok(())
}

/// Extract the text of every page into the knowledge file
pub async fn generate_content(config: Config, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| config.chat.knowledge_path.clone());
    let (client, table) = crawl(&config).await?;
    let source: &dyn ContentSource = &client;

    let pages = generate_page_content(source, &config.site.root_page_id, &table).await;
    write_page_content(&output, &pages)?;

    let chars: usize = pages.iter().map(|p| p.content.len()).sum();
    println!(
        "Wrote {} pages ({} chars) to {}",
        pages.len(),
        chars,
        output.display()
    );
    Ok(())
}
