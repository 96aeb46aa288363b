//! Upstream feed clients.

pub mod digitransit;
pub mod error;

pub use error::FeedError;

use std::future::Future;

use crate::sync::Trip;

/// An upstream source of trips for one feed and service date.
///
/// Implementations own transport, authentication and payload decoding and
/// never retry or fall back themselves; that policy lives in the sync
/// layer, which is the only place that knows the cache state.
pub trait FeedSource: Send + Sync + 'static {
    fn fetch_trips(
        &self,
        feed_id: &str,
        service_date_key: &str,
    ) -> impl Future<Output = Result<Vec<Trip>, FeedError>> + Send;
}
