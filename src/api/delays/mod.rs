pub mod summary;

pub use summary::{DelaySummaryListResponse, FeedSummary};

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppMonitor;

#[derive(Clone)]
pub struct DelaysState {
    pub monitor: Arc<AppMonitor>,
}

pub fn router(monitor: Arc<AppMonitor>) -> Router {
    let state = DelaysState { monitor };
    Router::new()
        .route("/", get(summary::list_delay_summaries))
        .route("/{feed_id}", get(summary::get_delay_summary))
        .with_state(state)
}
