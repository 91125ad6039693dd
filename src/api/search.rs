use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState, SearchQuery};
use crate::models::Anime;

/// Short queries return an empty list without reaching the upstream API.
pub async fn search_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<Anime>>> {
    let q = query.q.trim();
    if q.chars().count() < state.config.search.min_query_chars {
        return Json(ApiResponse::success(Vec::new()));
    }

    Json(ApiResponse::success(state.source.search_anime(q).await))
}

pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Anime>>, ApiError> {
    state
        .source
        .fetch_anime_by_id(id)
        .await
        .map(|anime| Json(ApiResponse::success(anime)))
        .ok_or_else(|| ApiError::anime_not_found(id))
}
