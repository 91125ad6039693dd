//! Derives the display list from a schedule bundle and the user's selections.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::constants::{DAYS_OF_WEEK, GENRES, limits::PAGE_SIZE};
use crate::models::Anime;
use crate::services::schedule::ScheduleBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Airing,
    Upcoming,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "airing" => Ok(Self::Airing),
            "upcoming" => Ok(Self::Upcoming),
            other => Err(format!("Unknown view mode '{other}' (expected airing or upcoming)")),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Airing => f.write_str("airing"),
            Self::Upcoming => f.write_str("upcoming"),
        }
    }
}

/// Genre selection. Only labels from [`GENRES`] are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Only(&'static str),
}

impl GenreFilter {
    /// Exact, case-sensitive lookup in the genre catalog.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let known = GENRES.iter().find(|g| **g == label)?;
        Some(if *known == "All" {
            Self::All
        } else {
            Self::Only(*known)
        })
    }

    #[must_use]
    pub fn matches(&self, anime: &Anime) -> bool {
        match self {
            Self::All => true,
            Self::Only(genre) => anime.has_genre(genre),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(genre) => *genre,
        }
    }
}

/// Today's weekday in the host's zone, Sunday = 0.
#[must_use]
pub fn today_weekday() -> u8 {
    #[allow(clippy::cast_possible_truncation)]
    let day = Local::now().weekday().num_days_from_sunday() as u8;
    day
}

/// Parses a weekday given as `0`-`6` (Sunday = 0) or an English day name.
#[must_use]
pub fn parse_weekday(input: &str) -> Option<u8> {
    let trimmed = input.trim();
    if let Ok(n) = trimmed.parse::<u8>() {
        return (n < 7).then_some(n);
    }

    DAYS_OF_WEEK
        .iter()
        .position(|d| {
            d.eq_ignore_ascii_case(trimmed)
                || (trimmed.len() >= 3 && d[..3].eq_ignore_ascii_case(trimmed))
        })
        .and_then(|i| u8::try_from(i).ok())
}

/// Immutable user selections. Every change produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub weekday: u8,
    pub genre: GenreFilter,
    pub visible_count: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::Airing,
            weekday: 0,
            genre: GenreFilter::All,
            visible_count: PAGE_SIZE,
        }
    }
}

impl ViewState {
    #[must_use]
    pub fn new(mode: ViewMode, weekday: u8, genre: GenreFilter) -> Self {
        Self {
            mode,
            weekday: weekday % 7,
            genre,
            visible_count: PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_mode(&self, mode: ViewMode) -> Self {
        Self {
            mode,
            visible_count: PAGE_SIZE,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_weekday(&self, weekday: u8) -> Self {
        Self {
            weekday: weekday % 7,
            visible_count: PAGE_SIZE,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_genre(&self, genre: GenreFilter) -> Self {
        Self {
            genre,
            visible_count: PAGE_SIZE,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn show_more(&self) -> Self {
        Self {
            visible_count: self.visible_count + PAGE_SIZE,
            ..self.clone()
        }
    }
}

/// Filters the selected collection, then keeps the first surviving record per
/// `source_id`. Upstream order is preserved.
#[must_use]
pub fn filter_view<'a>(bundle: &'a ScheduleBundle, state: &ViewState) -> Vec<&'a Anime> {
    let source = match state.mode {
        ViewMode::Airing => &bundle.airing,
        ViewMode::Upcoming => &bundle.upcoming,
    };

    let mut seen = HashSet::new();

    source
        .iter()
        .filter(|anime| match state.mode {
            ViewMode::Airing => anime.airing_weekday == state.weekday,
            ViewMode::Upcoming => true,
        })
        .filter(|anime| state.genre.matches(anime))
        .filter(|anime| seen.insert(anime.source_id))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewPage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_more: bool,
}

#[must_use]
pub fn paginate<T: Clone>(items: &[T], visible_count: usize) -> ViewPage<T> {
    let shown = items.len().min(visible_count);
    ViewPage {
        items: items[..shown].to_vec(),
        total: items.len(),
        has_more: shown < items.len(),
    }
}

#[must_use]
pub fn week_label(week_offset: i32) -> String {
    let n = week_offset.unsigned_abs();
    let plural = if n > 1 { "s" } else { "" };
    match week_offset {
        0 => "Current Week".to_string(),
        o if o > 0 => format!("{n} Week{plural} Ahead"),
        _ => format!("{n} Week{plural} Prior"),
    }
}
