mod info;
mod recommend;
mod schedule;
mod search;
mod season;

pub use info::cmd_anime_info;
pub use recommend::{cmd_recommend, cmd_summary};
pub use schedule::{cmd_past, cmd_schedule};
pub use search::cmd_search_anime;
pub use season::cmd_season;
