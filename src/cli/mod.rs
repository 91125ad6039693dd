//! Command-line interface for AniFlow.

mod commands;

use clap::{Parser, Subcommand};

/// AniFlow - weekly anime broadcast schedule
#[derive(Parser)]
#[command(name = "aniflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the airing schedule or the upcoming season
    #[command(alias = "s")]
    Schedule {
        /// Weeks relative to the current one (negative for past weeks)
        #[arg(long, short, default_value_t = 0, allow_hyphen_values = true)]
        week: i32,

        /// Weekday as 0-6 (Sunday = 0) or a day name; defaults to today
        #[arg(long, short)]
        day: Option<String>,

        /// Genre filter, e.g. "Slice of Life"
        #[arg(long, short, default_value = "All")]
        genre: String,

        /// "airing" or "upcoming"
        #[arg(long, short, default_value = "airing")]
        mode: String,

        /// Show every entry instead of the first page
        #[arg(long)]
        all: bool,
    },

    /// Show broadcasts from the last few days
    #[command(alias = "recent")]
    Past,

    /// Search the anime catalog
    #[command(alias = "f")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show details about a title
    #[command(alias = "i")]
    Info {
        /// AniList media ID
        id: i32,
    },

    /// Show the current and upcoming season
    Season,

    /// Ask for a recommendation from this week's schedule
    #[command(alias = "rec")]
    Recommend {
        /// What you are in the mood for
        #[arg(required = true)]
        prompt: Vec<String>,

        #[arg(long, short, default_value_t = 0, allow_hyphen_values = true)]
        week: i32,
    },

    /// Spoiler-free hype summary for a title
    Summary {
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Start the HTTP API server
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
