pub mod delays;
pub mod error;
pub mod health;

pub use error::{error_response, ErrorResponse};

use std::sync::Arc;

use axum::Router;

use crate::AppMonitor;

pub fn router(monitor: Arc<AppMonitor>) -> Router {
    Router::new()
        .nest("/delays", delays::router(monitor.clone()))
        .nest("/health", health::router(monitor))
}
