/*!
common/src/lib.rs

Shared configuration types for Feedlens.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file, with default/override layering
- The built-in list of feed sources used when the config names none
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default keyword string offered when neither the CLI nor the config sets one.
pub const DEFAULT_KEYWORDS: &str = "AI,ML,GenAI,GPT";

/// Fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub max_response_bytes: Option<u64>,
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of a cached feed, in seconds (0 disables the cache)
    pub ttl_seconds: Option<u64>,
}

/// Defaults for the filter controls; every field can be overridden on the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDefaults {
    /// Comma-separated keyword list, e.g. "AI,ML"
    pub keywords: Option<String>,
    pub max_items: Option<usize>,
    pub show_date: Option<bool>,
}

/// A named feed endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub fetch: Option<FetchConfig>,
    pub cache: Option<CacheConfig>,
    pub filter: Option<FilterDefaults>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// Arrays are replaced, not concatenated, so an override `[[sources]]` list
    /// replaces the default one entirely.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks the parts of the config that serde cannot. Source names and
    /// URLs are validated when the feed catalog is built from this config.
    pub fn validate(&self) -> Result<()> {
        if let Some(0) = self.filter.as_ref().and_then(|f| f.max_items) {
            anyhow::bail!("filter.max_items must be at least 1");
        }

        Ok(())
    }

    /// Configured sources, or the built-in list when the config names none.
    pub fn sources_or_default(&self) -> Vec<SourceConfig> {
        if self.sources.is_empty() {
            default_sources()
        } else {
            self.sources.clone()
        }
    }

    pub fn fetch_timeout_seconds(&self) -> u64 {
        self.fetch.as_ref().and_then(|f| f.timeout_seconds).unwrap_or(10)
    }

    pub fn user_agent(&self) -> String {
        self.fetch
            .as_ref()
            .and_then(|f| f.user_agent.clone())
            .unwrap_or_else(|| format!("Feedlens/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn max_response_bytes(&self) -> Option<u64> {
        self.fetch.as_ref().and_then(|f| f.max_response_bytes)
    }

    pub fn cache_ttl_seconds(&self) -> u64 {
        self.cache.as_ref().and_then(|c| c.ttl_seconds).unwrap_or(600)
    }

    pub fn default_keywords(&self) -> String {
        self.filter
            .as_ref()
            .and_then(|f| f.keywords.clone())
            .unwrap_or_else(|| DEFAULT_KEYWORDS.to_string())
    }

    pub fn default_max_items(&self) -> usize {
        self.filter.as_ref().and_then(|f| f.max_items).unwrap_or(5)
    }

    pub fn show_date(&self) -> bool {
        self.filter.as_ref().and_then(|f| f.show_date).unwrap_or(true)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// The AI / ML news sources shipped with Feedlens.
pub fn default_sources() -> Vec<SourceConfig> {
    [
        ("VentureBeat AI", "https://venturebeat.com/category/ai/feed/"),
        ("MIT Tech Review", "https://www.technologyreview.com/feed/"),
        ("The Verge", "https://www.theverge.com/rss/index.xml"),
        ("TechCrunch AI", "https://techcrunch.com/tag/artificial-intelligence/feed/"),
        ("ArXiv AI", "https://export.arxiv.org/rss/cs.AI"),
        ("ArXiv ML", "https://export.arxiv.org/rss/cs.LG"),
        ("Google AI Blog", "https://ai.googleblog.com/feeds/posts/default"),
        ("OpenAI Blog", "https://openai.com/blog/rss/"),
        ("Towards Data Science", "https://towardsdatascience.com/feed"),
    ]
    .into_iter()
    .map(|(name, url)| SourceConfig {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}
