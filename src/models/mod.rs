pub mod anime;
pub mod season;

pub use anime::{Anime, ExternalLink, Relation, Trailer, is_live_now};
pub use season::{Season, SeasonInfo, SeasonYear, UpcomingSeason};
