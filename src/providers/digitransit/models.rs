//! Wire types for the Digitransit routing API response.

use serde::Deserialize;

use crate::sync::{RealtimeState, StopEvent, Trip};

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
    pub data: Option<TripsData>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TripsData {
    pub trips: Vec<FeedTrip>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedTrip {
    pub id: String,
    #[serde(default)]
    pub route_short_name: Option<String>,
    #[serde(default)]
    pub trip_headsign: Option<String>,
    #[serde(default)]
    pub stoptimes_for_date: Vec<FeedStopTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStopTime {
    #[serde(default)]
    pub realtime_arrival: Option<i32>,
    #[serde(default)]
    pub scheduled_departure: i32,
    #[serde(default)]
    pub departure_delay: i32,
    #[serde(default)]
    pub realtime_state: RealtimeState,
    #[serde(default)]
    pub stop: Option<FeedStop>,
}

#[derive(Debug, Deserialize)]
pub struct FeedStop {
    pub name: String,
}

impl FeedTrip {
    pub fn into_trip(self) -> Trip {
        Trip {
            id: self.id,
            route_short_name: self.route_short_name.unwrap_or_default(),
            headsign: self.trip_headsign.unwrap_or_default(),
            stop_events: self
                .stoptimes_for_date
                .into_iter()
                .map(FeedStopTime::into_stop_event)
                .collect(),
        }
    }
}

impl FeedStopTime {
    fn into_stop_event(self) -> StopEvent {
        StopEvent {
            stop_name: self.stop.map(|s| s.name).unwrap_or_default(),
            scheduled_departure: self.scheduled_departure,
            realtime_arrival: self.realtime_arrival,
            departure_delay: self.departure_delay,
            realtime_state: self.realtime_state,
        }
    }
}
