use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// One item as handed over by a feed parser, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    /// May contain markup.
    pub summary: Option<String>,
}

/// Retrieval + parsing capability for a single feed URL.
#[async_trait::async_trait]
pub trait FeedParser: Send + Sync {
    /// Returns the entries of the feed at `url` in the order the feed lists them.
    async fn parse(&self, url: &str) -> Result<Vec<RawEntry>>;
}

/// Fetches feeds over HTTP with reqwest and parses RSS / Atom / JSON Feed with feed-rs.
/// Enforces a timeout and, when configured, a response size limit.
/// Failed requests are not retried.
#[derive(Debug, Clone)]
pub struct HttpFeedParser {
    client: Client,
    max_response_bytes: Option<u64>,
}

impl HttpFeedParser {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            max_response_bytes: None,
        })
    }

    pub fn with_max_response_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_response_bytes = limit;
        self
    }
}

#[async_trait::async_trait]
impl FeedParser for HttpFeedParser {
    async fn parse(&self, url: &str) -> Result<Vec<RawEntry>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("network error during fetch")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
        }

        if let (Some(limit), Some(len)) = (self.max_response_bytes, response.content_length()) {
            if len > limit {
                anyhow::bail!("feed body of {} bytes exceeds limit of {} bytes", len, limit);
            }
        }

        // Chunked responses carry no length up front, so enforce the limit while reading
        let mut response = response;
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.context("failed to read response body")? {
            bytes.extend_from_slice(&chunk);
            if let Some(limit) = self.max_response_bytes {
                if bytes.len() as u64 > limit {
                    anyhow::bail!("feed body exceeds limit of {} bytes", limit);
                }
            }
        }

        let feed = parser::parse(bytes.as_slice()).context("failed to parse feed")?;
        Ok(entries_from_feed(feed))
    }
}

/// Flattens a parsed feed into raw entries.
///
/// The link is the entry's `alternate` link (or its first link without a
/// `rel`), falling back to the first link. When an entry has no summary, an
/// inline content body stands in for it. Entries without a title or a link are
/// skipped since nothing can be rendered for them.
pub fn entries_from_feed(feed: Feed) -> Vec<RawEntry> {
    feed.entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.map(|t| t.content);
            let link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
                .or_else(|| entry.links.first())
                .map(|l| l.href.clone());
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));

            match (title, link) {
                (Some(title), Some(link)) if !link.is_empty() => Some(RawEntry {
                    title,
                    link,
                    published: entry.published,
                    summary,
                }),
                (title, link) => {
                    warn!("Skipping feed entry without title or link: title={:?} link={:?}", title, link);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::NormalizedEntry;
    use crate::filter::{filter, DateRange, FilterConfig};
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example</title>
    <link>https://example.com</link>
    <description>Example feed</description>
    <item>
      <title>First</title>
      <link>https://example.com/1</link>
      <pubDate>Wed, 10 Jan 2024 18:30:00 GMT</pubDate>
      <description>&lt;p&gt;Hello&lt;/p&gt;</description>
    </item>
    <item>
      <title>No link here</title>
      <description>dropped</description>
    </item>
    <item>
      <title>Undated</title>
      <link>https://example.com/3</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn flattens_rss_items_in_order() {
        let feed = parser::parse(RSS.as_bytes()).expect("parse rss");
        let entries = entries_from_feed(feed);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "First");
        assert_eq!(entries[0].link, "https://example.com/1");
        assert_eq!(
            entries[0].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 18, 30, 0).unwrap())
        );
        assert_eq!(entries[0].summary.as_deref(), Some("<p>Hello</p>"));

        assert_eq!(entries[1].title, "Undated");
        assert!(entries[1].published.is_none());
        assert!(entries[1].summary.is_none());
    }

    const BLOGGER_ATOM: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns='http://www.w3.org/2005/Atom'>
  <id>tag:blogger.com,1999:blog-1</id>
  <updated>2024-01-10T09:00:00Z</updated>
  <title type='text'>Research Blog</title>
  <entry>
    <id>tag:blogger.com,1999:blog-1.post-1</id>
    <published>2024-01-10T09:00:00Z</published>
    <updated>2024-01-10T09:00:00Z</updated>
    <title type='text'>Research update</title>
    <content type='html'>&lt;p&gt;Our new GPT style model&lt;/p&gt;</content>
    <link rel='replies' type='application/atom+xml' href='https://blog.example/feeds/1/comments/default'/>
    <link rel='alternate' type='text/html' href='https://blog.example/2024/01/research-update.html'/>
  </entry>
</feed>"#;

    #[test]
    fn content_body_stands_in_for_missing_summary() {
        let feed = parser::parse(BLOGGER_ATOM.as_bytes()).expect("parse atom");
        let entries = entries_from_feed(feed);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Research update");
        assert_eq!(entries[0].link, "https://blog.example/2024/01/research-update.html");
        let summary = entries[0].summary.as_deref().expect("summary from content");
        assert!(summary.contains("Our new GPT style model"));

        let entries: Vec<_> = entries.into_iter().map(NormalizedEntry::from_raw).collect();
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let config = FilterConfig::new(vec!["gpt".into()], DateRange::new(day, day), 5);
        assert_eq!(filter(&entries, &config).len(), 1);
    }
}
