use anyhow::{Context, Result};
use common::SourceConfig;
use serde::Serialize;
use std::collections::HashSet;

/// A named feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl From<SourceConfig> for FeedSource {
    fn from(cfg: SourceConfig) -> Self {
        Self::new(cfg.name, cfg.url)
    }
}

/// The fixed set of sources available for one process, in display order.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    sources: Vec<FeedSource>,
}

impl SourceCatalog {
    /// Names must be unique and non-empty, URLs must parse.
    pub fn new(sources: Vec<FeedSource>) -> Result<Self> {
        let mut seen = HashSet::new();
        for source in &sources {
            if source.name.trim().is_empty() {
                anyhow::bail!("feed source with url {} has an empty name", source.url);
            }
            if !seen.insert(source.name.as_str()) {
                anyhow::bail!("duplicate feed source name: {}", source.name);
            }
            url::Url::parse(&source.url)
                .with_context(|| format!("invalid url for feed source {}: {}", source.name, source.url))?;
        }
        Ok(Self { sources })
    }

    pub fn from_config(config: &common::Config) -> Result<Self> {
        Self::new(config.sources_or_default().into_iter().map(FeedSource::from).collect())
    }

    pub fn default_sources() -> Result<Self> {
        Self::new(common::default_sources().into_iter().map(FeedSource::from).collect())
    }

    pub fn get(&self, name: &str) -> Option<&FeedSource> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Resolves the selected names in the caller's order.
    /// An empty selection means every source, in catalog order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&FeedSource>> {
        if names.is_empty() {
            return Ok(self.sources.iter().collect());
        }

        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| {
                    anyhow::anyhow!(
                        "unknown feed source {:?} (available: {})",
                        name,
                        self.names().join(", ")
                    )
                })
            })
            .collect()
    }
}
