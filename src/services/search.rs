//! Debounced incremental search.
//!
//! Each keystroke gets a token. A lookup starts only once input has been
//! stable for the debounce interval, and only the lookup carrying the latest
//! token may publish its results. Older lookups still finish but are dropped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::models::Anime;
use crate::services::schedule::ScheduleSource;

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

/// What a consumer renders for the search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    pub generation: u64,
    pub query: String,
    pub results: Vec<Anime>,
    pub searching: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Pending { token: u64, deadline: Instant },
    InFlight { token: u64 },
}

struct PipelineState {
    latest: u64,
    phase: SearchPhase,
    timer: Option<JoinHandle<()>>,
}

pub struct SearchPipeline {
    source: Arc<dyn ScheduleSource>,
    debounce: Duration,
    min_chars: usize,
    lookup_timeout: Duration,
    state: Arc<Mutex<PipelineState>>,
    snapshot: Arc<watch::Sender<SearchSnapshot>>,
}

impl SearchPipeline {
    #[must_use]
    pub fn new(source: Arc<dyn ScheduleSource>, config: &SearchConfig) -> Self {
        let (tx, _rx) = watch::channel(SearchSnapshot::default());
        Self {
            source,
            debounce: Duration::from_millis(config.debounce_ms),
            min_chars: config.min_query_chars,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            state: Arc::new(Mutex::new(PipelineState {
                latest: 0,
                phase: SearchPhase::Idle,
                timer: None,
            })),
            snapshot: Arc::new(tx),
        }
    }

    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Feeds the current contents of the search box.
    pub async fn input(&self, text: &str) {
        let mut state = self.state.lock().await;
        state.latest += 1;
        let token = state.latest;

        // Clear a timer that has not fired yet. In-flight lookups run on and
        // are dropped when they try to publish.
        if matches!(state.phase, SearchPhase::Pending { .. })
            && let Some(timer) = state.timer.take()
        {
            timer.abort();
        }
        state.timer = None;

        if text.chars().count() < self.min_chars {
            state.phase = SearchPhase::Idle;
            self.snapshot.send_replace(SearchSnapshot {
                generation: token,
                query: text.to_string(),
                results: Vec::new(),
                searching: false,
            });
            return;
        }

        let deadline = Instant::now() + self.debounce;
        state.phase = SearchPhase::Pending { token, deadline };

        let task = LookupTask {
            token,
            query: text.to_string(),
            deadline,
            lookup_timeout: self.lookup_timeout,
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
            snapshot: Arc::clone(&self.snapshot),
        };
        state.timer = Some(tokio::spawn(task.run()));
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshot.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.snapshot.borrow().clone()
    }

    pub async fn phase(&self) -> SearchPhase {
        self.state.lock().await.phase
    }

    /// Waits until the most recent input has published its results.
    pub async fn settle(&self) -> SearchSnapshot {
        let latest = self.state.lock().await.latest;
        let mut rx = self.subscribe();
        rx.wait_for(|s| s.generation >= latest && !s.searching)
            .await
            .map_or_else(|_| self.snapshot(), |s| s.clone())
    }
}

struct LookupTask {
    token: u64,
    query: String,
    deadline: Instant,
    lookup_timeout: Duration,
    source: Arc<dyn ScheduleSource>,
    state: Arc<Mutex<PipelineState>>,
    snapshot: Arc<watch::Sender<SearchSnapshot>>,
}

impl LookupTask {
    async fn run(self) {
        tokio::time::sleep_until(self.deadline).await;

        {
            let mut state = self.state.lock().await;
            if state.latest != self.token {
                return;
            }
            state.phase = SearchPhase::InFlight { token: self.token };
            state.timer = None;

            // Published under the lock so a newer input cannot land in between.
            self.snapshot.send_modify(|s| {
                s.generation = self.token;
                s.query.clone_from(&self.query);
                s.searching = true;
            });
        }
        debug!(query = %self.query, token = self.token, "Search lookup started");

        let results = match tokio::time::timeout(
            self.lookup_timeout,
            self.source.search_anime(&self.query),
        )
        .await
        {
            Ok(results) => results,
            Err(_) => {
                warn!(query = %self.query, "Search lookup timed out");
                Vec::new()
            }
        };

        let mut state = self.state.lock().await;
        if state.latest != self.token {
            metrics::counter!("aniflow_search_superseded_total").increment(1);
            debug!(
                query = %self.query,
                token = self.token,
                latest = state.latest,
                "Dropping superseded search results"
            );
            return;
        }

        state.phase = SearchPhase::Idle;
        let outcome = if results.is_empty() { "empty" } else { "hit" };
        metrics::counter!("aniflow_search_lookups_total", "outcome" => outcome).increment(1);
        self.snapshot.send_replace(SearchSnapshot {
            generation: self.token,
            query: self.query,
            results,
            searching: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeSource;

    fn pipeline(source: &Arc<FakeSource>) -> SearchPipeline {
        let source: Arc<dyn ScheduleSource> = source.clone();
        SearchPipeline::new(source, &SearchConfig::default())
    }

    async fn settle_tasks() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn debounces_rapid_keystrokes() {
        let source = Arc::new(FakeSource::default());
        let search = pipeline(&source);

        search.input("n").await;
        tokio::time::advance(Duration::from_millis(100)).await;
        search.input("na").await;
        tokio::time::advance(Duration::from_millis(100)).await;
        search.input("nar").await;

        tokio::time::advance(Duration::from_millis(399)).await;
        settle_tasks().await;
        assert!(source.searches().is_empty());
        assert!(matches!(search.phase().await, SearchPhase::Pending { .. }));

        tokio::time::advance(Duration::from_millis(1)).await;
        let snapshot = search.settle().await;

        assert_eq!(source.searches(), vec!["nar".to_string()]);
        assert_eq!(snapshot.query, "nar");
        assert_eq!(snapshot.results.len(), 1);
        assert_eq!(search.phase().await, SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_never_searches_and_clears_results() {
        let source = Arc::new(FakeSource::default());
        let search = pipeline(&source);

        search.input("bleach").await;
        let first = search.settle().await;
        assert_eq!(first.results.len(), 1);

        search.input("b").await;
        let cleared = search.snapshot();
        assert!(cleared.results.is_empty());
        assert!(!cleared.searching);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.searches(), vec!["bleach".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_lookup_cannot_overwrite_newer_results() {
        let source = Arc::new(
            FakeSource::default()
                .with_delay("naruto", Duration::from_secs(3))
                .with_delay("bleach", Duration::from_millis(10)),
        );
        let search = pipeline(&source);

        search.input("naruto").await;
        tokio::time::sleep(Duration::from_millis(450)).await;
        assert!(matches!(search.phase().await, SearchPhase::InFlight { .. }));

        search.input("bleach").await;
        let snapshot = search.settle().await;
        assert_eq!(snapshot.query, "bleach");

        // Let the slow "naruto" lookup complete after "bleach".
        tokio::time::sleep(Duration::from_secs(5)).await;
        settle_tasks().await;

        assert_eq!(
            source.searches(),
            vec!["naruto".to_string(), "bleach".to_string()]
        );
        let visible = search.snapshot();
        assert_eq!(visible.query, "bleach");
        assert_eq!(visible.results[0].title, "bleach");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn superseded_start_never_replaces_newer_snapshot() {
        let source: Arc<dyn ScheduleSource> = Arc::new(FakeSource::default());
        let config = SearchConfig {
            debounce_ms: 0,
            ..SearchConfig::default()
        };

        let mut stale = 0;
        for _ in 0..500 {
            let search = SearchPipeline::new(Arc::clone(&source), &config);
            search.input("naruto").await;
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            search.input("n").await;
            tokio::time::sleep(Duration::from_millis(5)).await;

            let snapshot = search.snapshot();
            if snapshot.searching || snapshot.query != "n" {
                stale += 1;
            }
        }
        assert_eq!(stale, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_yields_empty_results() {
        let source = Arc::new(FakeSource::default().failing());
        let search = pipeline(&source);

        search.input("one piece").await;
        let snapshot = search.settle().await;
        assert!(snapshot.results.is_empty());
        assert_eq!(snapshot.query, "one piece");
    }

    #[tokio::test(start_paused = true)]
    async fn hung_lookup_times_out_to_empty() {
        let source = Arc::new(FakeSource::default().with_delay("frieren", Duration::from_secs(60)));
        let search = pipeline(&source).with_lookup_timeout(Duration::from_secs(15));

        search.input("frieren").await;
        let snapshot = search.settle().await;
        assert!(snapshot.results.is_empty());
        assert!(!snapshot.searching);
    }
}
