//! Type definitions for the sync module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-stop realtime status reported by the feed.
///
/// Upstream values outside this set (e.g. `ADDED`) fold into `Unknown`
/// instead of failing the whole response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RealtimeState {
    Scheduled,
    Updated,
    Canceled,
    #[serde(other)]
    #[default]
    Unknown,
}

/// One scheduled stop visit within a trip.
///
/// Delay and realtime-arrival fields carry live data only when
/// `realtime_state` is `Updated`.
#[derive(Debug, Clone, PartialEq)]
pub struct StopEvent {
    pub stop_name: String,
    /// Scheduled departure, seconds since local midnight of the service day
    pub scheduled_departure: i32,
    /// Live arrival estimate, seconds since local midnight
    pub realtime_arrival: Option<i32>,
    /// Departure delay in seconds; negative means early
    pub departure_delay: i32,
    pub realtime_state: RealtimeState,
}

/// One scheduled vehicle run across an ordered sequence of stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    /// Opaque identifier, unique within a feed and service date
    pub id: String,
    pub route_short_name: String,
    pub headsign: String,
    /// Stop visits in scheduled order
    pub stop_events: Vec<StopEvent>,
}

/// Detail row for one late stop of a delayed trip.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopDelay {
    pub stop_name: String,
    /// Whole minutes of delay, rounded down
    pub delay_minutes: i32,
    /// Absolute scheduled departure time, RFC 3339
    pub scheduled_departure: String,
    pub status: RealtimeState,
}

/// A trip with at least one stop past the trip-level delay threshold.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DelayedTrip {
    pub id: String,
    pub route_short_name: String,
    pub trip_headsign: String,
    /// Every stop past the stop-level threshold, in visit order
    pub delays: Vec<StopDelay>,
}

/// Aggregate delay picture for one feed at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DelaySummary {
    /// Trips with a live estimate for a stop still ahead
    pub total_trips: usize,
    pub delayed_trips: Vec<DelayedTrip>,
    /// Always equals `delayed_trips.len()`
    pub delayed_count: usize,
}

/// A summary plus the instant it was produced. Replaced wholesale on
/// refresh, never mutated.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub summary: DelaySummary,
    pub fetched_at: DateTime<Utc>,
}
