use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::fetcher::NormalizedEntry;

/// Memoization of fetched feeds, keyed by source URL.
pub trait FeedCache: Send + Sync {
    /// Returns the cached entries for `url` if they are still fresh.
    fn get(&self, url: &str) -> Option<Vec<NormalizedEntry>>;

    fn put(&self, url: &str, entries: Vec<NormalizedEntry>);

    /// Drops whatever is cached for `url`.
    fn expire(&self, url: &str);
}

/// Cache that never holds anything; every fetch goes to the parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl FeedCache for NoCache {
    fn get(&self, _url: &str) -> Option<Vec<NormalizedEntry>> {
        None
    }

    fn put(&self, _url: &str, _entries: Vec<NormalizedEntry>) {}

    fn expire(&self, _url: &str) {}
}

/// In-memory cache with a fixed time-to-live per entry.
/// Stale entries are evicted lazily on lookup.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Vec<NormalizedEntry>)>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (Instant, Vec<NormalizedEntry>)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FeedCache for TtlCache {
    fn get(&self, url: &str) -> Option<Vec<NormalizedEntry>> {
        let mut entries = self.lock();
        match entries.get(url) {
            Some((stored_at, cached)) if stored_at.elapsed() < self.ttl => Some(cached.clone()),
            Some(_) => {
                entries.remove(url);
                None
            }
            None => None,
        }
    }

    fn put(&self, url: &str, entries: Vec<NormalizedEntry>) {
        if self.ttl.is_zero() {
            return;
        }
        self.lock().insert(url.to_string(), (Instant::now(), entries));
    }

    fn expire(&self, url: &str) {
        self.lock().remove(url);
    }
}
