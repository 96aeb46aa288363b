//! Classification of fetched trips into the aggregate delay summary.
//!
//! Two independent, order-preserving filters run over the same trip set:
//! the active filter feeds `total_trips`, the delayed filter produces the
//! detail list. A trip can count as active without being delayed and the
//! other way around.

use chrono::Duration;

use super::clock::ServiceDay;
use super::types::{DelaySummary, DelayedTrip, RealtimeState, StopDelay, Trip};

/// Delay thresholds in seconds. The stop-level threshold is looser than the
/// trip-level gate: once a trip qualifies as delayed, all of its moderately
/// late stops are listed, not just the one that crossed the gate.
#[derive(Debug, Clone, Copy)]
pub struct DelayThresholds {
    /// A trip is delayed once one non-canceled stop exceeds this
    pub trip_secs: i32,
    /// Stops later than this are listed for a delayed trip
    pub stop_secs: i32,
}

impl Default for DelayThresholds {
    fn default() -> Self {
        Self {
            trip_secs: 300,
            stop_secs: 60,
        }
    }
}

/// A trip is active while it has a live estimate for a stop still ahead.
fn is_active(trip: &Trip, seconds_since_midnight: i64) -> bool {
    trip.stop_events.iter().any(|stop| {
        stop.realtime_state == RealtimeState::Updated
            && stop
                .realtime_arrival
                .is_some_and(|arrival| i64::from(arrival) > seconds_since_midnight)
    })
}

fn is_delayed(trip: &Trip, trip_threshold_secs: i32) -> bool {
    trip.stop_events.iter().any(|stop| {
        stop.departure_delay > trip_threshold_secs
            && stop.realtime_state != RealtimeState::Canceled
    })
}

fn delay_details(trip: &Trip, day: &ServiceDay, stop_threshold_secs: i32) -> Vec<StopDelay> {
    trip.stop_events
        .iter()
        .filter(|stop| stop.departure_delay > stop_threshold_secs)
        .map(|stop| StopDelay {
            stop_name: stop.stop_name.clone(),
            // Whole minutes, rounded down: 119 s reports as 1 minute
            delay_minutes: stop.departure_delay.div_euclid(60),
            scheduled_departure: (day.midnight
                + Duration::seconds(i64::from(stop.scheduled_departure)))
            .to_rfc3339(),
            status: stop.realtime_state,
        })
        .collect()
}

/// Reduce fetched trips to the summary served to the display client.
pub fn summarize(trips: &[Trip], day: &ServiceDay, thresholds: &DelayThresholds) -> DelaySummary {
    let total_trips = trips
        .iter()
        .filter(|trip| is_active(trip, day.seconds_since_midnight))
        .count();

    let delayed_trips: Vec<DelayedTrip> = trips
        .iter()
        .filter(|trip| is_delayed(trip, thresholds.trip_secs))
        .map(|trip| DelayedTrip {
            id: trip.id.clone(),
            route_short_name: trip.route_short_name.clone(),
            trip_headsign: trip.headsign.clone(),
            delays: delay_details(trip, day, thresholds.stop_secs),
        })
        .collect();

    DelaySummary {
        total_trips,
        delayed_count: delayed_trips.len(),
        delayed_trips,
    }
}
