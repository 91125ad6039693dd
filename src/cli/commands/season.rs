use crate::config::Config;
use crate::services::{AnilistScheduleSource, ScheduleSource};

pub fn cmd_season(config: &Config) {
    let info = AnilistScheduleSource::from_config(config).current_season_info();

    println!("Current:  {} {}", info.current.season, info.current.year);
    println!(
        "Upcoming: {} {} (starting {})",
        info.upcoming.season, info.upcoming.year, info.upcoming.month_name
    );
}
