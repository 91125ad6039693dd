use chrono::{Datelike, Month};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quarter-year broadcast bucket, named the way the upstream API names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Maps a zero-based month (January = 0) to its bucket.
    #[must_use]
    pub const fn from_month0(month0: u32) -> Self {
        match month0 {
            0..=2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Fall,
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Winter => Self::Spring,
            Self::Spring => Self::Summer,
            Self::Summer => Self::Fall,
            Self::Fall => Self::Winter,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Winter => "WINTER",
            Self::Spring => "SPRING",
            Self::Summer => "SUMMER",
            Self::Fall => "FALL",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonYear {
    pub season: Season,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingSeason {
    pub season: Season,
    pub year: i32,
    /// English name of the calendar month following the current one.
    pub month_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonInfo {
    pub current: SeasonYear,
    pub upcoming: UpcomingSeason,
}

impl SeasonInfo {
    /// Season buckets for the given calendar date. Pure; no clock access.
    #[must_use]
    pub fn at<D: Datelike>(date: &D) -> Self {
        let year = date.year();
        let month0 = date.month0();

        let season = Season::from_month0(month0);
        let next = season.next();
        let upcoming_year = if next == Season::Winter { year + 1 } else { year };

        let next_month = Month::try_from(u8::try_from((month0 + 1) % 12 + 1).unwrap_or(1))
            .unwrap_or(Month::January);

        Self {
            current: SeasonYear { season, year },
            upcoming: UpcomingSeason {
                season: next,
                year: upcoming_year,
                month_name: next_month.name().to_string(),
            },
        }
    }

    #[must_use]
    pub fn now() -> Self {
        Self::at(&chrono::Local::now())
    }
}
