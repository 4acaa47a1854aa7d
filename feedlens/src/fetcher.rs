use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{FeedCache, NoCache};
use crate::ingestion::{FeedParser, RawEntry};

/// A feed entry ready for filtering: the publication time is reduced to a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedEntry {
    pub title: String,
    pub link: String,
    pub date: Option<NaiveDate>,
    pub summary: Option<String>,
}

impl NormalizedEntry {
    /// Drops the time of day (UTC) and treats an empty summary as missing.
    pub fn from_raw(raw: RawEntry) -> Self {
        Self {
            title: raw.title,
            link: raw.link,
            date: raw.published.map(|published| published.date_naive()),
            summary: raw.summary.filter(|s| !s.is_empty()),
        }
    }
}

/// Anything that went wrong while retrieving or parsing one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFetchFailure {
    pub url: String,
    pub reason: String,
}

impl fmt::Display for SourceFetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to fetch feed {}: {}", self.url, self.reason)
    }
}

/// Receives non-fatal notices about sources that could not be fetched.
pub trait FailureReporter: Send + Sync {
    fn report(&self, failure: &SourceFetchFailure);
}

/// Reports failures through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &SourceFetchFailure) {
        tracing::error!(url = %failure.url, reason = %failure.reason, "RSS fetch error");
    }
}

/// Fetches and normalizes one feed at a time.
///
/// `fetch` never fails: any parser error is reported and turned into an empty
/// list, so one broken source cannot affect the others. Successful results
/// are memoized in the injected cache; failures are not.
#[derive(Clone)]
pub struct FeedFetcher {
    parser: Arc<dyn FeedParser>,
    cache: Arc<dyn FeedCache>,
    reporter: Arc<dyn FailureReporter>,
}

impl FeedFetcher {
    pub fn new(parser: Arc<dyn FeedParser>) -> Self {
        Self {
            parser,
            cache: Arc::new(NoCache),
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn FeedCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the entries of the feed at `url` in upstream order, or an empty list on failure.
    pub async fn fetch(&self, url: &str) -> Vec<NormalizedEntry> {
        if let Some(cached) = self.cache.get(url) {
            debug!("cache hit for {} ({} entries)", url, cached.len());
            return cached;
        }

        match self.try_fetch(url).await {
            Ok(entries) => {
                info!("Fetched feed '{}': {} items", url, entries.len());
                self.cache.put(url, entries.clone());
                entries
            }
            Err(failure) => {
                self.reporter.report(&failure);
                Vec::new()
            }
        }
    }

    /// Like `fetch`, but ignores any cached result for `url`.
    pub async fn refresh(&self, url: &str) -> Vec<NormalizedEntry> {
        self.cache.expire(url);
        self.fetch(url).await
    }

    async fn try_fetch(&self, url: &str) -> Result<Vec<NormalizedEntry>, SourceFetchFailure> {
        let raw = self.parser.parse(url).await.map_err(|e| SourceFetchFailure {
            url: url.to_string(),
            reason: format!("{:#}", e),
        })?;

        Ok(raw.into_iter().map(NormalizedEntry::from_raw).collect())
    }
}
