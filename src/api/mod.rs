use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::gemini::GeminiClient;
use crate::config::Config;
use crate::services::{AnilistScheduleSource, Advisor, RecommendationBridge, ScheduleSource};

mod error;
mod observability;
mod recommend;
mod schedule;
mod search;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub source: Arc<dyn ScheduleSource>,

    pub bridge: Arc<RecommendationBridge>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: Config,
        source: Arc<dyn ScheduleSource>,
        advisor: Arc<dyn Advisor>,
        prometheus_handle: Option<PrometheusHandle>,
    ) -> Self {
        let bridge = Arc::new(RecommendationBridge::new(
            advisor,
            config.advisor.temperature,
        ));
        Self {
            config: Arc::new(config),
            source,
            bridge,
            prometheus_handle,
        }
    }
}

/// Wires the AniList-backed source and the Gemini advisor from `config`.
#[must_use]
pub fn create_app_state(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let source: Arc<dyn ScheduleSource> = Arc::new(AnilistScheduleSource::from_config(&config));
    let advisor: Arc<dyn Advisor> = Arc::new(GeminiClient::new(&config.advisor));

    Arc::new(AppState::new(config, source, advisor, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/schedule", get(schedule::get_schedule))
        .route("/view", get(schedule::get_view))
        .route("/season", get(schedule::get_season))
        .route("/search", get(search::search_anime))
        .route("/anime/{id}", get(search::get_anime))
        .route("/recommend", post(recommend::recommend))
        .route("/summary", post(recommend::summarize))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
