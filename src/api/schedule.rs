use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState, ViewDto, ViewItemDto, ViewQuery, WeekQuery};
use crate::models::SeasonInfo;
use crate::services::{
    GenreFilter, ScheduleBundle, ViewMode, ViewState, fetch_or_placeholder, filter_view, paginate,
    parse_weekday, today_weekday, week_label,
};

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<ApiResponse<ScheduleBundle>>, ApiError> {
    let bundle = state.source.fetch_all_schedules(query.week_offset).await?;
    Ok(Json(ApiResponse::success(bundle)))
}

fn view_state(query: &ViewQuery) -> Result<ViewState, ApiError> {
    let mode = query
        .mode
        .as_deref()
        .map(str::parse::<ViewMode>)
        .transpose()
        .map_err(ApiError::validation)?
        .unwrap_or_default();

    let weekday = match query.weekday.as_deref() {
        Some(raw) => parse_weekday(raw)
            .ok_or_else(|| ApiError::validation(format!("Unknown weekday '{raw}'")))?,
        None => today_weekday(),
    };

    let genre = match query.genre.as_deref() {
        Some(raw) => GenreFilter::parse(raw)
            .ok_or_else(|| ApiError::validation(format!("Unknown genre '{raw}'")))?,
        None => GenreFilter::All,
    };

    let mut view = ViewState::new(mode, weekday, genre);
    if let Some(visible) = query.visible {
        view.visible_count = visible.max(1);
    }
    Ok(view)
}

pub async fn get_view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ApiResponse<ViewDto>>, ApiError> {
    let view = view_state(&query)?;

    let (bundle, placeholder) = fetch_or_placeholder(
        &state.source,
        query.week_offset,
        state.config.schedule.placeholder_on_failure,
    )
    .await?;

    let now = Utc::now().timestamp();
    let page = paginate(&filter_view(&bundle, &view), view.visible_count);
    let items = page
        .items
        .into_iter()
        .map(|anime| ViewItemDto {
            is_live: anime.is_live_at(now),
            score_label: anime.score_label(),
            anime: anime.clone(),
        })
        .collect();

    Ok(Json(ApiResponse::success(ViewDto {
        week_offset: query.week_offset,
        week_label: week_label(query.week_offset),
        mode: view.mode,
        weekday: view.weekday,
        genre: view.genre.label().to_string(),
        placeholder,
        items,
        total: page.total,
        has_more: page.has_more,
    })))
}

pub async fn get_season(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SeasonInfo>> {
    Json(ApiResponse::success(state.source.current_season_info()))
}
