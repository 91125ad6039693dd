use serde::{Deserialize, Serialize};

use crate::models::Anime;
use crate::services::ViewMode;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    #[serde(default)]
    pub week_offset: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub week_offset: i32,
    pub mode: Option<String>,
    pub weekday: Option<String>,
    pub genre: Option<String>,
    pub visible: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewItemDto {
    #[serde(flatten)]
    pub anime: Anime,
    pub is_live: bool,
    pub score_label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewDto {
    pub week_offset: i32,
    pub week_label: String,
    pub mode: ViewMode,
    pub weekday: u8,
    pub genre: String,
    pub placeholder: bool,
    pub items: Vec<ViewItemDto>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub prompt: String,
    #[serde(default)]
    pub week_offset: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendation: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}
