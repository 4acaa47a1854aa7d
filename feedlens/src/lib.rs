// Library interface for feedlens modules
// This allows tests and other binaries to import modules

pub mod cache;
pub mod fetcher;
pub mod filter;
pub mod ingestion;
pub mod pipeline;
pub mod render;
pub mod sources;

pub use cache::{FeedCache, NoCache, TtlCache};
pub use fetcher::{FailureReporter, FeedFetcher, NormalizedEntry, SourceFetchFailure, TracingReporter};
pub use filter::{filter, parse_keywords, DateRange, FilterConfig, MatchResult};
pub use ingestion::{FeedParser, HttpFeedParser, RawEntry};
pub use sources::{FeedSource, SourceCatalog};
