pub const DEFAULT_DESCRIPTION: &str = "No description available.";

pub const TIME_PLACEHOLDER: &str = "TBA";

pub const UNKNOWN_STUDIO: &str = "Unknown";

pub const UNRATED_LABEL: &str = "NEW";

pub const DAYS_OF_WEEK: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Genre labels offered as filters. `"All"` disables genre filtering.
pub const GENRES: &[&str] = &[
    "All",
    "Action",
    "Adventure",
    "Comedy",
    "Drama",
    "Fantasy",
    "Horror",
    "Mecha",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Slice of Life",
    "Sports",
    "Thriller",
];

pub mod fallback {

    pub const RECOMMENDATION: &str = "I couldn't generate a recommendation right now. Why not try watching the highest rated one?";

    pub const SUMMARY: &str = "An epic journey awaits you in this season's latest release.";
}

pub mod intervals {
    pub const SEARCH_DEBOUNCE_MS: u64 = 400;

    /// Half-width of the window around a scheduled instant that counts as live.
    pub const LIVE_WINDOW_SECS: i64 = 30 * 60;

    pub const SECONDS_PER_DAY: i64 = 86_400;

    pub const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;
}

pub mod limits {

    pub const MIN_SEARCH_CHARS: usize = 2;

    pub const MAX_SEARCH_RESULTS: u32 = 12;

    pub const RECOMMENDATION_SLICE: usize = 15;

    pub const PAGE_SIZE: usize = 12;

    pub const PAST_WINDOW_DAYS: i64 = 3;
}
