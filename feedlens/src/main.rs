/*
feedlens - command line entry point.
Fetches the selected feeds, filters them by keyword and date, and prints the matches.
*/

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use common::Config;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use feedlens::pipeline;
use feedlens::render::{JsonRenderer, Renderer, TerminalRenderer};
use feedlens::{parse_keywords, DateRange, FeedFetcher, FilterConfig, HttpFeedParser, SourceCatalog, TtlCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "feedlens", about = "Keyword and date filtered RSS reader")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source to show (repeatable); defaults to every configured source
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Comma-separated keywords, e.g. "AI,ML,GenAI,GPT"; an empty string matches everything
    #[arg(long)]
    keywords: Option<String>,

    /// First day of the date range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    from: Option<NaiveDate>,

    /// Last day of the date range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    to: Option<NaiveDate>,

    /// Maximum number of items per source
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=20))]
    max_items: Option<u8>,

    /// Hide publication dates
    #[arg(long)]
    no_date: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the configured sources and exit
    #[arg(long)]
    list_sources: bool,

    /// Re-run every SECONDS until interrupted
    #[arg(long, value_name = "SECONDS")]
    watch: Option<u64>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Picker semantics: a missing endpoint takes the other one, and both default to today.
fn resolve_range(from: Option<NaiveDate>, to: Option<NaiveDate>, today: NaiveDate) -> DateRange {
    let (start, end) = match (from, to) {
        (Some(start), Some(end)) => (start, end),
        (Some(day), None) | (None, Some(day)) => (day, day),
        (None, None) => (today, today),
    };
    DateRange::new(start, end)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging; stdout is reserved for rendered output
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config.clone() {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let catalog = SourceCatalog::from_config(&config)?;

    if args.list_sources {
        for source in catalog.iter() {
            println!("{}\t{}", source.name, source.url);
        }
        return Ok(());
    }

    // Reject unknown names before fetching anything
    catalog.select(&args.sources)?;

    let parser = HttpFeedParser::new(config.fetch_timeout_seconds(), &config.user_agent())?
        .with_max_response_bytes(config.max_response_bytes());
    let cache = Arc::new(TtlCache::new(Duration::from_secs(config.cache_ttl_seconds())));
    let fetcher = FeedFetcher::new(Arc::new(parser)).with_cache(cache);

    let keywords = parse_keywords(&args.keywords.clone().unwrap_or_else(|| config.default_keywords()));
    let max_items = args.max_items.map(usize::from).unwrap_or_else(|| config.default_max_items());
    let show_date = config.show_date() && !args.no_date;

    loop {
        let range = resolve_range(args.from, args.to, Local::now().date_naive());
        let filter_config = FilterConfig::new(keywords.clone(), range, max_items);

        let stdout = io::stdout();
        let mut renderer: Box<dyn Renderer> = match args.format {
            OutputFormat::Text => Box::new(TerminalRenderer::new(stdout.lock(), show_date)),
            OutputFormat::Json => Box::new(JsonRenderer::new(stdout.lock(), show_date)),
        };
        pipeline::run(&catalog, &args.sources, &fetcher, &filter_config, renderer.as_mut())
            .await
            .context("failed to render feeds")?;
        drop(renderer);

        let Some(secs) = args.watch else { break };
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                // Loop again
            },
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received, stopping");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_to_widened_today() {
        let range = resolve_range(None, None, day(2024, 3, 1));
        assert_eq!(range.start(), day(2000, 1, 1));
        assert_eq!(range.end(), day(2024, 3, 1));
    }

    #[test]
    fn single_endpoint_is_used_for_both_ends() {
        let range = resolve_range(Some(day(2024, 2, 1)), None, day(2024, 3, 1));
        assert_eq!(range.start(), day(2000, 1, 1));
        assert_eq!(range.end(), day(2024, 2, 1));
    }

    #[test]
    fn explicit_range_is_kept() {
        let range = resolve_range(Some(day(2024, 1, 1)), Some(day(2024, 1, 31)), day(2024, 3, 1));
        assert_eq!(range.start(), day(2024, 1, 1));
        assert_eq!(range.end(), day(2024, 1, 31));
    }

    #[test]
    fn cli_rejects_out_of_range_max_items() {
        assert!(Args::try_parse_from(["feedlens", "--max-items", "21"]).is_err());
        assert!(Args::try_parse_from(["feedlens", "--max-items", "0"]).is_err());
        let args = Args::try_parse_from(["feedlens", "--max-items", "20", "--source", "ArXiv AI"]).unwrap();
        assert_eq!(args.max_items, Some(20));
        assert_eq!(args.sources, vec!["ArXiv AI".to_string()]);
    }
}
