use axum::{Json, extract::State};
use std::sync::Arc;

use crate::api::{
    ApiError, ApiResponse, AppState, RecommendRequest, RecommendResponse, SummaryRequest,
    SummaryResponse,
};
use crate::services::{fetch_or_placeholder, schedule_slice};

pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<ApiResponse<RecommendResponse>>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::validation("Prompt must not be empty"));
    }
    if state.bridge.is_busy() {
        return Err(ApiError::conflict("A recommendation is already running"));
    }

    let (bundle, _) = fetch_or_placeholder(
        &state.source,
        request.week_offset,
        state.config.schedule.placeholder_on_failure,
    )
    .await?;
    let slice = schedule_slice(&bundle.airing, state.config.advisor.schedule_slice);

    // The bridge may have been claimed while the schedule was loading.
    let recommendation = state
        .bridge
        .request(slice, &request.prompt)
        .await
        .ok_or_else(|| ApiError::conflict("A recommendation is already running"))?;

    Ok(Json(ApiResponse::success(RecommendResponse {
        recommendation,
    })))
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<ApiResponse<SummaryResponse>>, ApiError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Title must not be empty"));
    }

    let summary = state.bridge.summarize(title).await;
    Ok(Json(ApiResponse::success(SummaryResponse { summary })))
}
