use chrono::NaiveDate;
use regex::Regex;
use tracing::warn;

use crate::fetcher::NormalizedEntry;

/// Lower bound used when a single-day range is widened.
pub fn widened_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Inclusive date range applied to dated entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds the range from the two picker endpoints.
    ///
    /// When `start == end` the range is widened to `[2000-01-01, end]`: a
    /// single-day selection means "everything up to and including that day",
    /// not "exactly that day".
    ///
    /// An inverted range (`start > end`) is kept as is and matches no dated entry.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start == end {
            Self {
                start: widened_start(),
                end,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Splits a comma-separated keyword string into trimmed, lowercase, non-empty tokens.
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Per-run filter settings. Immutable once built.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    keywords: Vec<String>,
    patterns: Vec<Regex>,
    date_range: DateRange,
    max_items: usize,
}

impl FilterConfig {
    /// `keywords` are lowercased and trimmed; empty tokens are dropped, and an
    /// empty list matches everything. `max_items` below 1 is raised to 1.
    pub fn new(keywords: Vec<String>, date_range: DateRange, max_items: usize) -> Self {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }

        let patterns = normalized
            .iter()
            .filter_map(|k| match Regex::new(&format!(r"\b{}\b", regex::escape(k))) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("ignoring keyword {:?}: {}", k, e);
                    None
                }
            })
            .collect();

        Self {
            keywords: normalized,
            patterns,
            date_range,
            max_items: max_items.max(1),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// True when no keyword is configured or at least one appears as a whole word.
    /// `text` must already be lowercase.
    fn keywords_match(&self, text: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(text))
    }

    /// Undated entries always pass.
    fn date_matches(&self, date: Option<NaiveDate>) -> bool {
        date.map_or(true, |d| self.date_range.contains(d))
    }

    /// Whether a single entry passes both predicates.
    pub fn matches(&self, entry: &NormalizedEntry) -> bool {
        let text = format!(
            "{} {}",
            entry.title,
            entry.summary.as_deref().unwrap_or_default()
        )
        .to_lowercase();

        self.keywords_match(&text) && self.date_matches(entry.date)
    }
}

/// An entry that passed the filter, with the date it was judged by.
pub type Match = (NormalizedEntry, Option<NaiveDate>);

/// Matches for one source, in feed order, at most `max_items` long.
pub type MatchResult = Vec<Match>;

/// Keeps the entries passing `config`, in input order, truncated to `config.max_items()`.
pub fn filter(entries: &[NormalizedEntry], config: &FilterConfig) -> MatchResult {
    entries
        .iter()
        .filter(|entry| config.matches(entry))
        .take(config.max_items())
        .map(|entry| (entry.clone(), entry.date))
        .collect()
}
