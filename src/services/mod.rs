pub mod normalize;
pub use normalize::{clean_description, normalize};

pub mod schedule;
pub use schedule::{
    AnilistScheduleSource, FetchTicket, ScheduleBoard, ScheduleBundle, ScheduleError,
    ScheduleSource, WeekWindow, fetch_or_placeholder, placeholder_schedule,
};

pub mod view;
pub use view::{
    GenreFilter, ViewMode, ViewPage, ViewState, filter_view, paginate, parse_weekday, today_weekday,
    week_label,
};

pub mod search;
pub use search::{SearchPhase, SearchPipeline, SearchSnapshot};

pub mod recommend;
pub use recommend::{Advisor, AdvisorError, RecommendationBridge, schedule_slice};

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::schedule::{ScheduleBundle, ScheduleError, ScheduleSource, placeholder_schedule};
    use crate::models::Anime;

    /// In-memory [`ScheduleSource`] that records search calls.
    #[derive(Default)]
    pub struct FakeSource {
        delays: HashMap<String, Duration>,
        failing: bool,
        searches: Mutex<Vec<String>>,
    }

    impl FakeSource {
        pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
            self.delays.insert(query.to_string(), delay);
            self
        }

        pub fn failing(mut self) -> Self {
            self.failing = true;
            self
        }

        pub fn searches(&self) -> Vec<String> {
            self.searches.lock().unwrap().clone()
        }
    }

    pub fn titled(title: &str) -> Anime {
        let mut anime = placeholder_schedule(0).airing.remove(0);
        anime.title = title.to_string();
        anime
    }

    #[async_trait::async_trait]
    impl ScheduleSource for FakeSource {
        async fn fetch_all_schedules(&self, _week_offset: i32) -> Result<ScheduleBundle, ScheduleError> {
            if self.failing {
                Err(ScheduleError::Transport("offline".to_string()))
            } else {
                Ok(placeholder_schedule(0))
            }
        }

        async fn fetch_anime_by_id(&self, id: i32) -> Option<Anime> {
            placeholder_schedule(0)
                .airing
                .into_iter()
                .find(|a| a.source_id == id)
        }

        async fn search_anime(&self, query: &str) -> Vec<Anime> {
            self.searches.lock().unwrap().push(query.to_string());
            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing {
                return Vec::new();
            }
            vec![titled(query)]
        }
    }
}
