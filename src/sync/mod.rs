//! Refresh orchestration and in-memory caching of delay summaries.
//!
//! This module handles:
//! - The get-or-fetch entry point used by the API handlers
//! - Classification of fetched trips into per-feed summaries
//! - Stale-fallback when the upstream feed fails
//! - The periodic background refresh loop

mod cache;
mod classify;
mod clock;
mod types;

// Re-export types for API compatibility
pub use cache::SummaryCache;
pub use classify::{summarize, DelayThresholds};
pub use clock::{Clock, ServiceDay, SystemClock};
pub use types::{CacheEntry, DelaySummary, DelayedTrip, RealtimeState, StopDelay, StopEvent, Trip};

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::Duration;
use chrono_tz::Tz;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::providers::{FeedError, FeedSource};

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Unknown feed: {0}")]
    UnknownFeed(String),
    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Orchestrates fetch, classification and caching for the configured feeds.
///
/// Each feed owns one async mutex held across the whole get-or-fetch
/// sequence, so concurrent cache misses collapse into a single upstream
/// call: late arrivals wait on the lock and find the fresh entry.
pub struct DelayMonitor<S, C> {
    source: S,
    clock: C,
    timezone: Tz,
    thresholds: DelayThresholds,
    cache_ttl: Duration,
    poll_interval: StdDuration,
    feeds: Vec<String>,
    caches: HashMap<String, Mutex<SummaryCache>>,
}

impl<S: FeedSource, C: Clock> DelayMonitor<S, C> {
    pub fn new(source: S, clock: C, config: &Config) -> Self {
        let feed_sync = &config.feed_sync;
        let caches = config
            .feeds
            .iter()
            .map(|feed| (feed.clone(), Mutex::new(SummaryCache::default())))
            .collect();

        Self {
            source,
            clock,
            timezone: feed_sync.parsed_timezone(),
            thresholds: DelayThresholds {
                trip_secs: feed_sync.trip_delay_threshold_secs,
                stop_secs: feed_sync.stop_delay_threshold_secs,
            },
            cache_ttl: Duration::seconds(feed_sync.cache_ttl_secs as i64),
            poll_interval: StdDuration::from_secs(feed_sync.poll_interval_secs),
            feeds: config.feeds.clone(),
            caches,
        }
    }

    /// Configured feed identifiers, in configuration order.
    pub fn feed_ids(&self) -> &[String] {
        &self.feeds
    }

    pub fn poll_interval(&self) -> StdDuration {
        self.poll_interval
    }

    /// Current delay summary for `feed_id`: cached if fresh, otherwise
    /// refreshed from upstream, otherwise the last known summary when the
    /// refresh fails. Fails only for unknown feeds or when there is no
    /// cached summary to fall back to.
    pub async fn summary(&self, feed_id: &str) -> Result<DelaySummary, SummaryError> {
        let cache = self
            .caches
            .get(feed_id)
            .ok_or_else(|| SummaryError::UnknownFeed(feed_id.to_string()))?;
        let mut cache = cache.lock().await;

        let now = self.clock.now_utc();
        if let Some(entry) = cache.valid_at(now, self.cache_ttl) {
            return Ok(entry.summary.clone());
        }

        // Service day is derived fresh on every fetch so a request right
        // after local midnight queries the new date key.
        let day = ServiceDay::at(now, self.timezone);

        match self.source.fetch_trips(feed_id, &day.date_key).await {
            Ok(trips) => {
                let summary = summarize(&trips, &day, &self.thresholds);
                info!(
                    feed = feed_id,
                    total = summary.total_trips,
                    delayed = summary.delayed_count,
                    "Refreshed delay summary"
                );
                cache.put(summary.clone(), now);
                Ok(summary)
            }
            Err(err) => {
                // Fallback keeps the original timestamp: the entry stays
                // expired and the next request tries upstream again.
                if let Some(entry) = cache.get() {
                    if err.is_data_quality() {
                        warn!(
                            feed = feed_id,
                            error = %err,
                            "Feed response unusable, serving last known summary"
                        );
                    } else {
                        warn!(
                            feed = feed_id,
                            error = %err,
                            age_secs = (now - entry.fetched_at).num_seconds(),
                            "Feed unavailable, serving last known summary"
                        );
                    }
                    Ok(entry.summary.clone())
                } else {
                    error!(
                        feed = feed_id,
                        error = %err,
                        "Feed refresh failed with no cached summary"
                    );
                    Err(err.into())
                }
            }
        }
    }

    /// Background refresh loop. Keeps every configured feed warm through
    /// the same entry point the handlers use, so interactive requests are
    /// normally served straight from cache.
    pub async fn start(&self) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            feeds = self.feeds.len(),
            "Starting delay summary poller"
        );
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            interval.tick().await;
            for feed in &self.feeds {
                if let Err(err) = self.summary(feed).await {
                    warn!(feed = %feed, error = %err, "Scheduled refresh failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedSyncConfig;
    use chrono::{DateTime, Utc};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // --- Test doubles ---

    struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn at(s: &str) -> Self {
            Self(std::sync::Mutex::new(instant(s)))
        }

        fn advance_to(&self, s: &str) {
            *self.0.lock().unwrap() = instant(s);
        }
    }

    impl Clock for Arc<ManualClock> {
        fn now_utc(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    struct StubFeed {
        calls: AtomicUsize,
        fetch_delay: StdDuration,
        responses: std::sync::Mutex<VecDeque<Result<Vec<Trip>, FeedError>>>,
    }

    impl StubFeed {
        fn with(responses: Vec<Result<Vec<Trip>, FeedError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fetch_delay: StdDuration::ZERO,
                responses: std::sync::Mutex::new(responses.into()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FeedSource for Arc<StubFeed> {
        async fn fetch_trips(
            &self,
            _feed_id: &str,
            _service_date_key: &str,
        ) -> Result<Vec<Trip>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.fetch_delay.is_zero() {
                tokio::time::sleep(self.fetch_delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FeedError::MalformedMessage("stub exhausted".into())))
        }
    }

    // --- Fixtures ---

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn test_config() -> Config {
        Config {
            feeds: vec!["tampere".to_string()],
            cors_origins: vec![],
            cors_permissive: true,
            feed_sync: FeedSyncConfig::default(),
        }
    }

    fn late_trip(id: &str, delay: i32) -> Trip {
        Trip {
            id: id.to_string(),
            route_short_name: "3".to_string(),
            headsign: "Keskustori".to_string(),
            stop_events: vec![StopEvent {
                stop_name: "Koskipuisto".to_string(),
                scheduled_departure: 43_200,
                realtime_arrival: Some(86_000),
                departure_delay: delay,
                realtime_state: RealtimeState::Updated,
            }],
        }
    }

    fn monitor(
        stub: Arc<StubFeed>,
        clock: Arc<ManualClock>,
    ) -> DelayMonitor<Arc<StubFeed>, Arc<ManualClock>> {
        DelayMonitor::new(stub, clock, &test_config())
    }

    // --- Tests ---

    #[tokio::test]
    async fn fresh_cache_serves_without_upstream_call() {
        let stub = StubFeed::with(vec![Ok(vec![late_trip("T1", 310)])]);
        let clock = Arc::new(ManualClock::at("2026-02-02T10:00:00Z"));
        let monitor = monitor(stub.clone(), clock.clone());

        let first = monitor.summary("tampere").await.unwrap();
        assert_eq!(first.delayed_count, 1);
        assert_eq!(stub.calls(), 1);

        // 89 s later: still within the 90 s TTL
        clock.advance_to("2026-02-02T10:01:29Z");
        let second = monitor.summary("tampere").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let stub = StubFeed::with(vec![
            Ok(vec![late_trip("T1", 310)]),
            Ok(vec![late_trip("T1", 310), late_trip("T2", 400)]),
        ]);
        let clock = Arc::new(ManualClock::at("2026-02-02T10:00:00Z"));
        let monitor = monitor(stub.clone(), clock.clone());

        monitor.summary("tampere").await.unwrap();
        clock.advance_to("2026-02-02T10:01:30Z"); // exactly at TTL
        let second = monitor.summary("tampere").await.unwrap();
        assert_eq!(second.delayed_count, 2);
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn upstream_failure_serves_stale_summary() {
        let stub = StubFeed::with(vec![
            Ok(vec![late_trip("T1", 310)]),
            Err(FeedError::Upstream("HTTP 503".into())),
        ]);
        let clock = Arc::new(ManualClock::at("2026-02-02T10:00:00Z"));
        let monitor = monitor(stub.clone(), clock.clone());

        let first = monitor.summary("tampere").await.unwrap();

        clock.advance_to("2026-02-02T10:02:00Z"); // past TTL
        let fallback = monitor.summary("tampere").await.unwrap();
        assert_eq!(fallback, first);
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn fallback_does_not_refresh_cache_timestamp() {
        let stub = StubFeed::with(vec![
            Ok(vec![late_trip("T1", 310)]),
            Err(FeedError::Upstream("HTTP 503".into())),
            Ok(vec![late_trip("T2", 400)]),
        ]);
        let clock = Arc::new(ManualClock::at("2026-02-02T10:00:00Z"));
        let monitor = monitor(stub.clone(), clock.clone());

        monitor.summary("tampere").await.unwrap();

        // Failed refresh at t0+100s serves the stale entry unchanged
        clock.advance_to("2026-02-02T10:01:40Z");
        let fallback = monitor.summary("tampere").await.unwrap();
        assert_eq!(fallback.delayed_trips[0].id, "T1");

        // 20 s after the failed attempt the entry must still count as
        // expired (age measured from the original fetch), so upstream is
        // tried again and the new data comes through.
        clock.advance_to("2026-02-02T10:02:00Z");
        let refreshed = monitor.summary("tampere").await.unwrap();
        assert_eq!(refreshed.delayed_trips[0].id, "T2");
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test]
    async fn malformed_response_also_falls_back() {
        let stub = StubFeed::with(vec![
            Ok(vec![late_trip("T1", 310)]),
            Err(FeedError::MalformedMessage("response has no data".into())),
        ]);
        let clock = Arc::new(ManualClock::at("2026-02-02T10:00:00Z"));
        let monitor = monitor(stub.clone(), clock.clone());

        let first = monitor.summary("tampere").await.unwrap();
        clock.advance_to("2026-02-02T10:02:00Z");
        let fallback = monitor.summary("tampere").await.unwrap();
        assert_eq!(fallback, first);
    }

    #[tokio::test]
    async fn failure_without_cache_is_an_error() {
        let stub = StubFeed::with(vec![Err(FeedError::Upstream("HTTP 502".into()))]);
        let clock = Arc::new(ManualClock::at("2026-02-02T10:00:00Z"));
        let monitor = monitor(stub.clone(), clock.clone());

        let err = monitor.summary("tampere").await.unwrap_err();
        assert!(matches!(err, SummaryError::Feed(FeedError::Upstream(_))));
    }

    #[tokio::test]
    async fn unknown_feed_is_rejected_without_upstream_call() {
        let stub = StubFeed::with(vec![]);
        let clock = Arc::new(ManualClock::at("2026-02-02T10:00:00Z"));
        let monitor = monitor(stub.clone(), clock.clone());

        let err = monitor.summary("oslo").await.unwrap_err();
        assert!(matches!(err, SummaryError::UnknownFeed(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_misses_collapse_into_one_fetch() {
        let stub = Arc::new(StubFeed {
            calls: AtomicUsize::new(0),
            fetch_delay: StdDuration::from_millis(50),
            responses: std::sync::Mutex::new(
                vec![Ok(vec![late_trip("T1", 310)])].into(),
            ),
        });
        let clock = Arc::new(ManualClock::at("2026-02-02T10:00:00Z"));
        let monitor = Arc::new(monitor(stub.clone(), clock.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let monitor = monitor.clone();
                tokio::spawn(async move { monitor.summary("tampere").await })
            })
            .collect();

        let results = futures::future::join_all(tasks).await;
        let summaries: Vec<DelaySummary> = results
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(stub.calls(), 1);
        assert!(summaries.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn service_date_key_follows_the_clock_across_midnight() {
        struct DateRecorder {
            dates: std::sync::Mutex<Vec<String>>,
        }

        impl FeedSource for Arc<DateRecorder> {
            async fn fetch_trips(
                &self,
                _feed_id: &str,
                service_date_key: &str,
            ) -> Result<Vec<Trip>, FeedError> {
                self.dates.lock().unwrap().push(service_date_key.to_string());
                Ok(vec![])
            }
        }

        let recorder = Arc::new(DateRecorder {
            dates: std::sync::Mutex::new(vec![]),
        });
        let clock = Arc::new(ManualClock::at("2026-02-02T21:59:00Z")); // 23:59 Helsinki
        let monitor = DelayMonitor::new(recorder.clone(), clock.clone(), &test_config());

        monitor.summary("tampere").await.unwrap();
        clock.advance_to("2026-02-02T22:05:00Z"); // 00:05 Helsinki, next day, past TTL
        monitor.summary("tampere").await.unwrap();

        let dates = recorder.dates.lock().unwrap();
        assert_eq!(dates.as_slice(), ["20260202", "20260203"]);
    }
}
