//! In-memory cache of the last successful summary per feed.

use chrono::{DateTime, Duration, Utc};

use super::types::{CacheEntry, DelaySummary};

/// Holds the last successful summary for one feed. Last-writer-wins, no
/// history; the entry survives its TTL so it can serve as a fallback when
/// the upstream feed is unavailable.
#[derive(Debug, Default)]
pub struct SummaryCache {
    entry: Option<CacheEntry>,
}

impl SummaryCache {
    /// Last entry regardless of age.
    pub fn get(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    pub fn put(&mut self, summary: DelaySummary, now: DateTime<Utc>) {
        self.entry = Some(CacheEntry {
            summary,
            fetched_at: now,
        });
    }

    /// Entry if it is still fresh at `now`.
    pub fn valid_at(&self, now: DateTime<Utc>, ttl: Duration) -> Option<&CacheEntry> {
        self.entry
            .as_ref()
            .filter(|entry| now - entry.fetched_at < ttl)
    }
}
