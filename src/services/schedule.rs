//! Schedule aggregation: one composite fetch per week window, split into
//! airing, upcoming-season and recently-past collections.

use chrono::{DateTime, Datelike, Days, Local, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::anilist::{AnilistClient, AnilistError, ScheduleVariables};
use crate::config::{Config, ScheduleConfig, SearchConfig};
use crate::constants::intervals::{SECONDS_PER_DAY, SECONDS_PER_WEEK};
use crate::models::{Anime, SeasonInfo};
use crate::services::normalize::normalize;

/// Failure of the primary schedule fetch. Callers must branch on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Schedule transport error: {0}")]
    Transport(String),

    #[error("Schedule data error: {0}")]
    DataShape(String),
}

impl From<AnilistError> for ScheduleError {
    fn from(err: AnilistError) -> Self {
        match err {
            AnilistError::Transport(e) => Self::Transport(e.to_string()),
            AnilistError::DataShape(msg) => Self::DataShape(msg),
        }
    }
}

/// The three collections produced by one schedule fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleBundle {
    /// Slots inside the week window, ascending by airing time.
    pub airing: Vec<Anime>,
    /// Not-yet-released titles of the upcoming season, by popularity.
    pub upcoming: Vec<Anime>,
    /// Slots from the trailing past window, most recent first.
    pub past: Vec<Anime>,
}

/// Half-open `[start, end)` range of epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub start: i64,
    pub end: i64,
}

impl WeekWindow {
    /// Seven days from local midnight of the Sunday on or before
    /// `now + week_offset` weeks.
    #[must_use]
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>, week_offset: i32) -> Self {
        let tz = now.timezone();
        let shifted = shift_days(now.date_naive(), i64::from(week_offset) * 7);
        let sunday = shift_days(
            shifted,
            -i64::from(shifted.weekday().num_days_from_sunday()),
        );

        let start = tz
            .from_local_datetime(&sunday.and_time(NaiveTime::MIN))
            .earliest()
            .map_or_else(
                || sunday.and_time(NaiveTime::MIN).and_utc().timestamp(),
                |dt| dt.timestamp(),
            );

        Self {
            start,
            end: start + SECONDS_PER_WEEK,
        }
    }

    #[must_use]
    pub const fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts < self.end
    }
}

fn shift_days(date: chrono::NaiveDate, days: i64) -> chrono::NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(date)
}

/// Source of schedule data consumed by the view and the HTTP/CLI surfaces.
///
/// `fetch_all_schedules` is the primary-data channel and returns failures.
/// The lookups are enhancements and fail closed.
#[async_trait::async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch_all_schedules(&self, week_offset: i32) -> Result<ScheduleBundle, ScheduleError>;

    async fn fetch_anime_by_id(&self, id: i32) -> Option<Anime>;

    async fn search_anime(&self, query: &str) -> Vec<Anime>;

    fn current_season_info(&self) -> SeasonInfo {
        SeasonInfo::now()
    }
}

/// [`ScheduleSource`] backed by the AniList GraphQL API.
///
/// Times are rendered in `Tz`; the default is the host's local zone.
pub struct AnilistScheduleSource<Tz: TimeZone = Local> {
    client: AnilistClient,
    schedule: ScheduleConfig,
    search_page_size: u32,
    tz: Tz,
}

impl AnilistScheduleSource<Local> {
    #[must_use]
    pub fn new(client: AnilistClient, schedule: ScheduleConfig, search: &SearchConfig) -> Self {
        Self::with_timezone(client, schedule, search, Local)
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            AnilistClient::new(&config.anilist),
            config.schedule.clone(),
            &config.search,
        )
    }
}

impl<Tz> AnilistScheduleSource<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: fmt::Display + Send + Sync,
{
    #[must_use]
    pub fn with_timezone(
        client: AnilistClient,
        schedule: ScheduleConfig,
        search: &SearchConfig,
        tz: Tz,
    ) -> Self {
        Self {
            client,
            schedule,
            search_page_size: search.max_results,
            tz,
        }
    }

    /// Same as [`ScheduleSource::fetch_all_schedules`] with an explicit clock.
    pub async fn fetch_all_schedules_at(
        &self,
        week_offset: i32,
        now: DateTime<Utc>,
    ) -> Result<ScheduleBundle, ScheduleError> {
        let local_now = now.with_timezone(&self.tz);
        let window = WeekWindow::at(&local_now, week_offset);
        let season = SeasonInfo::at(&local_now);
        let now_ts = now.timestamp();

        debug!(
            week_offset,
            start = window.start,
            end = window.end,
            season = %season.upcoming.season,
            year = season.upcoming.year,
            "Fetching schedules"
        );

        let variables = ScheduleVariables {
            airing_start: window.start,
            airing_end: window.end,
            airing_per_page: self.schedule.airing_page_size,
            past_start: now_ts - self.schedule.past_window_days * SECONDS_PER_DAY,
            past_end: now_ts,
            past_per_page: self.schedule.past_page_size,
            upcoming_season: season.upcoming.season.as_str(),
            upcoming_year: season.upcoming.year,
            upcoming_per_page: self.schedule.upcoming_page_size,
        };

        let pages = match self.client.fetch_schedule_pages(variables).await {
            Ok(pages) => pages,
            Err(e) => {
                metrics::counter!("aniflow_schedule_fetch_total", "outcome" => "error")
                    .increment(1);
                warn!(week_offset, error = %e, "Schedule fetch failed");
                return Err(e.into());
            }
        };

        let bundle = ScheduleBundle {
            airing: pages
                .airing
                .iter()
                .map(|s| normalize(&s.media, Some(s.airing_at), Some(s.episode), &self.tz))
                .collect(),
            upcoming: pages
                .upcoming
                .iter()
                .map(|m| normalize(m, None, None, &self.tz))
                .collect(),
            past: pages
                .past
                .iter()
                .map(|s| normalize(&s.media, Some(s.airing_at), Some(s.episode), &self.tz))
                .collect(),
        };

        metrics::counter!("aniflow_schedule_fetch_total", "outcome" => "success").increment(1);
        info!(
            week_offset,
            airing = bundle.airing.len(),
            upcoming = bundle.upcoming.len(),
            past = bundle.past.len(),
            "Schedules fetched"
        );

        Ok(bundle)
    }
}

#[async_trait::async_trait]
impl<Tz> ScheduleSource for AnilistScheduleSource<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: fmt::Display + Send + Sync,
{
    async fn fetch_all_schedules(&self, week_offset: i32) -> Result<ScheduleBundle, ScheduleError> {
        self.fetch_all_schedules_at(week_offset, Utc::now()).await
    }

    async fn fetch_anime_by_id(&self, id: i32) -> Option<Anime> {
        match self.client.get_by_id(id).await {
            Ok(media) => media.map(|m| normalize(&m, None, None, &self.tz)),
            Err(e) => {
                warn!(id, error = %e, "Anime lookup failed");
                None
            }
        }
    }

    async fn search_anime(&self, query: &str) -> Vec<Anime> {
        match self.client.search_media(query, self.search_page_size).await {
            Ok(media) => media
                .iter()
                .map(|m| normalize(m, None, None, &self.tz))
                .collect(),
            Err(e) => {
                warn!(query, error = %e, "Anime search failed");
                Vec::new()
            }
        }
    }

    fn current_season_info(&self) -> SeasonInfo {
        SeasonInfo::at(&Utc::now().with_timezone(&self.tz))
    }
}

/// Ticket handed out by [`ScheduleBoard::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub week_offset: i32,
}

/// Holds the latest applied schedule and drops results from superseded fetches.
///
/// Meant for long-lived presentation consumers that switch weeks while a
/// fetch is still running: call [`begin`](Self::begin) on every week change and
/// [`commit`](Self::commit) when the fetch returns. One-shot callers such as
/// the HTTP handlers and CLI commands go through [`fetch_or_placeholder`],
/// where only the fallback handling applies.
#[derive(Debug, Default)]
pub struct ScheduleBoard {
    latest: u64,
    week_offset: i32,
    bundle: ScheduleBundle,
    placeholder: bool,
    loading: bool,
}

impl ScheduleBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, week_offset: i32) -> FetchTicket {
        self.latest += 1;
        self.loading = true;
        FetchTicket {
            generation: self.latest,
            week_offset,
        }
    }

    /// Applies a finished fetch. Returns `false` when the ticket was superseded.
    ///
    /// On failure the bundle is replaced with the placeholder schedule when
    /// `placeholder_on_failure` is set, otherwise the previous bundle stays and
    /// the error is returned to the caller.
    pub fn commit(
        &mut self,
        ticket: FetchTicket,
        result: Result<ScheduleBundle, ScheduleError>,
        placeholder_on_failure: bool,
    ) -> Result<bool, ScheduleError> {
        if ticket.generation != self.latest {
            debug!(
                week_offset = ticket.week_offset,
                generation = ticket.generation,
                latest = self.latest,
                "Discarding superseded schedule fetch"
            );
            return Ok(false);
        }

        self.loading = false;
        self.week_offset = ticket.week_offset;

        match result {
            Ok(bundle) => {
                self.bundle = bundle;
                self.placeholder = false;
                Ok(true)
            }
            Err(e) if placeholder_on_failure => {
                warn!(error = %e, "Using placeholder schedule");
                self.bundle = placeholder_schedule(Utc::now().timestamp());
                self.placeholder = true;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    #[must_use]
    pub const fn bundle(&self) -> &ScheduleBundle {
        &self.bundle
    }

    #[must_use]
    pub const fn week_offset(&self) -> i32 {
        self.week_offset
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }
}

/// Fetches through `source` and falls back to the placeholder schedule on failure.
///
/// Returns the bundle and whether it is the placeholder. Each call uses its
/// own single-ticket [`ScheduleBoard`], so there is nothing to supersede.
pub async fn fetch_or_placeholder(
    source: &Arc<dyn ScheduleSource>,
    week_offset: i32,
    placeholder_on_failure: bool,
) -> Result<(ScheduleBundle, bool), ScheduleError> {
    let mut board = ScheduleBoard::new();
    let ticket = board.begin(week_offset);
    let result = source.fetch_all_schedules(week_offset).await;
    board.commit(ticket, result, placeholder_on_failure)?;
    let placeholder = board.is_placeholder();
    Ok((board.bundle, placeholder))
}

/// Fixed stand-in airing list shown when the upstream schedule is unavailable.
#[must_use]
pub fn placeholder_schedule(now: i64) -> ScheduleBundle {
    let entries: [(i32, &str, u8, &str, &[&str], &str, i32, f32, &str); 5] = [
        (
            100_001,
            "Blue Lock: VS. U-20 JAPAN",
            6,
            "23:30",
            &["Sports", "Shounen"],
            "The intense battle for survival continues as the Blue Lock project faces its biggest challenge yet.",
            12,
            8.4,
            "8bit",
        ),
        (
            100_002,
            "Re:Zero Season 3",
            3,
            "22:30",
            &["Fantasy", "Drama", "Psychological"],
            "Subaru Natsuki continues his struggle against fate in the kingdom of Lugunica.",
            1,
            8.9,
            "White Fox",
        ),
        (
            100_003,
            "Bleach: Thousand-Year Blood War",
            6,
            "23:00",
            &["Action", "Fantasy"],
            "The final arc of the legendary Bleach series reaches its climax.",
            27,
            9.1,
            "Pierrot",
        ),
        (
            100_004,
            "DanMachi V",
            4,
            "23:00",
            &["Adventure", "Fantasy"],
            "Bell Cranel dives deeper into the Dungeon to protect those he loves.",
            5,
            7.8,
            "J.C.Staff",
        ),
        (
            100_005,
            "Shangri-La Frontier S2",
            0,
            "17:00",
            &["Action", "Adventure"],
            "The \"Trash-Game Hunter\" Sunraku takes on the ultimate VRMMO challenge.",
            4,
            8.2,
            "C2C",
        ),
    ];

    let airing = entries
        .iter()
        .enumerate()
        .map(
            |(i, &(source_id, title, weekday, time, genres, description, episode, score, studio))| {
                Anime {
                    id: (i + 1).to_string(),
                    source_id,
                    title: title.to_string(),
                    image: format!("https://picsum.photos/seed/anime{}/400/600", i + 1),
                    banner: None,
                    airing_weekday: weekday,
                    airing_time_display: time.to_string(),
                    raw_airing_time: now,
                    genres: genres.iter().map(ToString::to_string).collect(),
                    description: description.to_string(),
                    episode_number: episode,
                    score,
                    studio: studio.to_string(),
                    trailer: None,
                    external_links: vec![],
                    relations: vec![],
                }
            },
        )
        .collect();

    ScheduleBundle {
        airing,
        upcoming: vec![],
        past: vec![],
    }
}
