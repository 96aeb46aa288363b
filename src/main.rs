pub mod api;
mod config;
mod providers;
mod sync;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::{Config, ConfigError};
use providers::digitransit::DigitransitProvider;
use sync::{DelayMonitor, SystemClock};

/// The monitor as wired in production: Digitransit upstream, wall clock.
pub type AppMonitor = DelayMonitor<DigitransitProvider, SystemClock>;

#[derive(OpenApi)]
#[openapi(
    info(title = "DelayCheck API", version = "0.2.0"),
    paths(
        api::delays::summary::list_delay_summaries,
        api::delays::summary::get_delay_summary,
        api::health::health_check,
    ),
    components(schemas(
        api::ErrorResponse,
        api::delays::DelaySummaryListResponse,
        api::delays::FeedSummary,
        api::health::HealthResponse,
        sync::DelaySummary,
        sync::DelayedTrip,
        sync::StopDelay,
        sync::RealtimeState,
    )),
    tags(
        (name = "delays", description = "Aggregate delay summaries per feed"),
        (name = "health", description = "Service health check")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::load("config.yaml").expect("Failed to load config");
    config.validate();
    tracing::info!(feeds = config.feeds.len(), "Loaded configuration");

    // Build CORS layer based on config
    let cors_layer = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode explicitly enabled (all origins allowed) - DO NOT USE IN PRODUCTION");
        CorsLayer::permissive()
    } else if !config.cors_origins.is_empty() {
        tracing::info!(origins = ?config.cors_origins, "CORS: Restricting to configured origins");
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    } else {
        panic!("CORS configuration error: Either set 'cors_origins' with allowed origins, or set 'cors_permissive: true' for development");
    };

    // The subscription key is required up front; there is no degraded mode
    // without upstream access.
    let subscription_key = std::env::var("DIGITRANSIT_KEY")
        .map_err(|_| ConfigError::MissingCredential("DIGITRANSIT_KEY"))
        .expect("Missing Digitransit subscription key");

    let provider = DigitransitProvider::new(&config.feed_sync, subscription_key)
        .expect("Failed to initialize Digitransit client");
    let monitor = Arc::new(DelayMonitor::new(provider, SystemClock, &config));

    // Start the background poller so requests are served from cache
    let poll_monitor = monitor.clone();
    tokio::spawn(async move {
        poll_monitor.start().await;
    });

    // Build the app
    let app = Router::new()
        .route("/", get(root))
        .nest("/api", api::router(monitor))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to port 3000");

    tracing::info!("Server running on http://localhost:3000");
    tracing::info!("Swagger UI: http://localhost:3000/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

async fn root() -> &'static str {
    "DelayCheck API"
}
