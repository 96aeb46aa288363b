//! Digitransit routing API provider.
//!
//! Posts a GraphQL query for all trips of a feed with their stop times for
//! the requested service date and converts the JSON response into domain
//! trips. Authentication is a subscription key sent as a request header.

pub mod models;

use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::config::FeedSyncConfig;
use crate::sync::Trip;

use super::error::FeedError;
use super::FeedSource;
use models::GraphqlResponse;

const SUBSCRIPTION_KEY_HEADER: &str = "digitransit-subscription-key";

/// Selection matching what the display client needs: per-trip stop times
/// for the service date with realtime delay fields.
const TRIPS_QUERY: &str = "\
query DelayedTrips($feeds: [String!], $serviceDate: String!) {
  trips(feeds: $feeds) {
    id
    routeShortName
    tripHeadsign
    stoptimesForDate(serviceDate: $serviceDate) {
      realtimeArrival
      scheduledDeparture
      departureDelay
      realtimeState
      stop { name }
    }
  }
}";

pub struct DigitransitProvider {
    client: reqwest::Client,
    endpoint: String,
    subscription_key: String,
    fetch_timeout: Duration,
}

impl DigitransitProvider {
    pub fn new(config: &FeedSyncConfig, subscription_key: String) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent("delaycheck/0.2")
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            subscription_key,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        })
    }
}

impl FeedSource for DigitransitProvider {
    async fn fetch_trips(
        &self,
        feed_id: &str,
        service_date_key: &str,
    ) -> Result<Vec<Trip>, FeedError> {
        let body = json!({
            "query": TRIPS_QUERY,
            "variables": {
                "feeds": [feed_id],
                "serviceDate": service_date_key,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .json(&body)
            .timeout(self.fetch_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::Upstream(format!(
                "Digitransit HTTP {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        let parsed: GraphqlResponse = serde_json::from_str(&text)?;

        if let Some(err) = parsed.errors.first() {
            return Err(FeedError::MalformedMessage(format!(
                "GraphQL error: {}",
                err.message
            )));
        }

        let data = parsed
            .data
            .ok_or_else(|| FeedError::MalformedMessage("response has no data".into()))?;

        debug!(
            feed = feed_id,
            service_date = service_date_key,
            trips = data.trips.len(),
            "Fetched trips from Digitransit"
        );

        Ok(data
            .trips
            .into_iter()
            .map(models::FeedTrip::into_trip)
            .collect())
    }
}
