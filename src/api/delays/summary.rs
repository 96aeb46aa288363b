use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::{error_response, ErrorResponse};
use crate::sync::{DelaySummary, SummaryError};

use super::DelaysState;

#[derive(Debug, Serialize, ToSchema)]
pub struct DelaySummaryListResponse {
    pub feeds: Vec<FeedSummary>,
}

/// Per-feed result in the list response. A feed that cannot be refreshed
/// and has no cached summary reports its error here instead of failing the
/// whole response.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedSummary {
    pub feed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DelaySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Delay summaries for all configured feeds
#[utoipa::path(
    get,
    path = "/api/delays",
    responses(
        (status = 200, description = "Summaries for every configured feed", body = DelaySummaryListResponse)
    ),
    tag = "delays"
)]
pub async fn list_delay_summaries(
    State(state): State<DelaysState>,
) -> Json<DelaySummaryListResponse> {
    let mut feeds = Vec::new();
    for feed in state.monitor.feed_ids() {
        match state.monitor.summary(feed).await {
            Ok(summary) => feeds.push(FeedSummary {
                feed: feed.clone(),
                summary: Some(summary),
                error: None,
            }),
            Err(err) => feeds.push(FeedSummary {
                feed: feed.clone(),
                summary: None,
                error: Some(err.to_string()),
            }),
        }
    }
    Json(DelaySummaryListResponse { feeds })
}

/// Delay summary for one feed
#[utoipa::path(
    get,
    path = "/api/delays/{feed_id}",
    params(
        ("feed_id" = String, Path, description = "Configured feed identifier")
    ),
    responses(
        (status = 200, description = "Current delay summary", body = DelaySummary),
        (status = 404, description = "Feed is not configured", body = ErrorResponse),
        (status = 502, description = "Feed unavailable and no cached summary exists", body = ErrorResponse)
    ),
    tag = "delays"
)]
pub async fn get_delay_summary(
    State(state): State<DelaysState>,
    Path(feed_id): Path<String>,
) -> Result<Json<DelaySummary>, (StatusCode, Json<ErrorResponse>)> {
    match state.monitor.summary(&feed_id).await {
        Ok(summary) => Ok(Json(summary)),
        Err(err @ SummaryError::UnknownFeed(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, err.to_string()))
        }
        Err(SummaryError::Feed(err)) => {
            Err(error_response(StatusCode::BAD_GATEWAY, err.to_string()))
        }
    }
}
