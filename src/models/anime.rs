use serde::{Deserialize, Serialize};

use crate::constants::{UNRATED_LABEL, intervals::LIVE_WINDOW_SECS};

/// One display record: a title, optionally bound to a single airing slot.
///
/// Two sentinels carry meaning and are kept as plain zeros:
/// `raw_airing_time == 0` marks a record that did not come from an airing
/// slot, and `score == 0.0` marks an unrated title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub id: String,
    pub source_id: i32,
    pub title: String,
    pub image: String,
    pub banner: Option<String>,
    pub airing_weekday: u8,
    pub airing_time_display: String,
    pub raw_airing_time: i64,
    pub genres: Vec<String>,
    pub description: String,
    pub episode_number: i32,
    pub score: f32,
    pub studio: String,
    pub trailer: Option<Trailer>,
    #[serde(default)]
    pub external_links: Vec<ExternalLink>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Anime {
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        self.raw_airing_time != 0
    }

    /// The score on the 0-10 scale, or `None` for unrated titles.
    #[must_use]
    pub fn rated_score(&self) -> Option<f32> {
        (self.score > 0.0).then_some(self.score)
    }

    #[must_use]
    pub fn score_label(&self) -> String {
        self.rated_score()
            .map_or_else(|| UNRATED_LABEL.to_string(), |s| format!("{s:.1}"))
    }

    #[must_use]
    pub const fn is_live_at(&self, now: i64) -> bool {
        is_live_now(self.raw_airing_time, now)
    }

    #[must_use]
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

/// Whether a broadcast scheduled at `raw_airing_time` is on air at `now`.
///
/// The window straddles the scheduled instant by 30 minutes on each side.
/// Unscheduled records (`0`) are never live.
#[must_use]
pub const fn is_live_now(raw_airing_time: i64, now: i64) -> bool {
    raw_airing_time != 0 && (now - raw_airing_time).abs() < LIVE_WINDOW_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
    pub id: String,
    pub site: String,
}

impl Trailer {
    #[must_use]
    pub fn embed_url(&self) -> String {
        if self.site.eq_ignore_ascii_case("dailymotion") {
            format!("https://www.dailymotion.com/embed/video/{}", self.id)
        } else {
            format!("https://www.youtube.com/embed/{}", self.id)
        }
    }

    #[must_use]
    pub fn watch_url(&self) -> String {
        if self.site.eq_ignore_ascii_case("dailymotion") {
            format!("https://www.dailymotion.com/video/{}", self.id)
        } else {
            format!("https://www.youtube.com/watch?v={}", self.id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub site: String,
    pub url: String,
}

/// A related title, kept one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: i32,
    pub title: String,
    pub relation_type: String,
    pub image: String,
}
