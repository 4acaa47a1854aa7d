use common::Config;
use feedlens::{FeedParser, HttpFeedParser, SourceCatalog};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::load_with_defaults(
        Some(Path::new("config.default.toml")),
        Some(Path::new("config.toml")),
    )
    .await?;
    let catalog = SourceCatalog::from_config(&config)?;
    let parser = HttpFeedParser::new(config.fetch_timeout_seconds(), &config.user_agent())?
        .with_max_response_bytes(config.max_response_bytes());

    for source in catalog.iter() {
        println!("\n{}", "=".repeat(60));
        println!("Checking: {} ({})", source.name, source.url);
        println!("{}", "=".repeat(60));

        match parser.parse(&source.url).await {
            Ok(entries) => {
                let dated = entries.iter().filter(|e| e.published.is_some()).count();
                println!("✓ Success!");
                println!("  Entries: {} ({} dated)", entries.len(), dated);

                if !entries.is_empty() {
                    println!("\n  First 3 entries:");
                    for (i, entry) in entries.iter().take(3).enumerate() {
                        println!("    {}. {}", i + 1, entry.title);
                        println!("       URL: {}", entry.link);
                        let summary_len = entry.summary.as_ref().map(|s| s.len()).unwrap_or(0);
                        println!("       Published: {:?}, Summary: {} chars", entry.published, summary_len);
                    }
                }
            }
            Err(e) => {
                println!("✗ Failed: {:#}", e);
            }
        }
    }

    Ok(())
}
