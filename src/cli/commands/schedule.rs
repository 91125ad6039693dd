use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

use crate::config::Config;
use crate::constants::DAYS_OF_WEEK;
use crate::models::Anime;
use crate::services::{
    AnilistScheduleSource, GenreFilter, ScheduleSource, ViewMode, ViewState, fetch_or_placeholder,
    filter_view, paginate, parse_weekday, today_weekday, week_label,
};

pub async fn cmd_schedule(
    config: &Config,
    week: i32,
    day: Option<&str>,
    genre: &str,
    mode: &str,
    all: bool,
) -> anyhow::Result<()> {
    let mode: ViewMode = mode.parse().map_err(anyhow::Error::msg)?;
    let weekday = match day {
        Some(d) => parse_weekday(d).with_context(|| format!("Unknown weekday '{d}'"))?,
        None => today_weekday(),
    };
    let genre = GenreFilter::parse(genre).with_context(|| format!("Unknown genre '{genre}'"))?;
    let view = ViewState::new(mode, weekday, genre);

    let source: Arc<dyn ScheduleSource> = Arc::new(AnilistScheduleSource::from_config(config));
    let (bundle, placeholder) =
        fetch_or_placeholder(&source, week, config.schedule.placeholder_on_failure).await?;

    match view.mode {
        ViewMode::Airing => println!(
            "{} | {} | {}",
            week_label(week),
            DAYS_OF_WEEK[usize::from(view.weekday)],
            view.genre.label()
        ),
        ViewMode::Upcoming => {
            let season = source.current_season_info();
            println!(
                "Upcoming: {} {} | {}",
                season.upcoming.season,
                season.upcoming.year,
                view.genre.label()
            );
        }
    }
    println!("{:-<60}", "");

    if placeholder {
        println!("⚠ Schedule unavailable, showing sample titles\n");
    }

    let filtered = filter_view(&bundle, &view);
    if filtered.is_empty() {
        println!("No anime found for this selection.");
        return Ok(());
    }

    let visible = if all { filtered.len() } else { view.visible_count };
    let page = paginate(&filtered, visible);
    let now = Utc::now().timestamp();

    for anime in &page.items {
        print_entry(anime, now);
    }

    if page.has_more {
        println!(
            "Showing {} of {}. Use --all to see everything.",
            page.items.len(),
            page.total
        );
    }

    Ok(())
}

pub async fn cmd_past(config: &Config) -> anyhow::Result<()> {
    let source = AnilistScheduleSource::from_config(config);
    let bundle = source.fetch_all_schedules(0).await?;

    println!(
        "Aired in the last {} days",
        config.schedule.past_window_days
    );
    println!("{:-<60}", "");

    if bundle.past.is_empty() {
        println!("Nothing aired recently.");
        return Ok(());
    }

    let now = Utc::now().timestamp();
    for anime in &bundle.past {
        print_entry(anime, now);
    }

    Ok(())
}

fn print_entry(anime: &Anime, now: i64) {
    let live = if anime.is_live_at(now) { " [LIVE]" } else { "" };
    let episode = if anime.episode_number > 0 {
        format!(" EP {}", anime.episode_number)
    } else {
        String::new()
    };

    println!("• {}{}{}", anime.title, episode, live);
    println!(
        "  {} {} | ★ {} | {} | ID: {}",
        DAYS_OF_WEEK[usize::from(anime.airing_weekday % 7)],
        anime.airing_time_display,
        anime.score_label(),
        anime.studio,
        anime.source_id
    );
    if !anime.genres.is_empty() {
        println!("  {}", anime.genres.join(", "));
    }
    println!();
}
