//! Free-text recommendations over the current schedule.
//!
//! Every call fails closed: an advisor error turns into a fixed fallback
//! sentence and is only visible in the logs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

use crate::clients::gemini::{GeminiClient, GeminiError};
use crate::constants::{fallback, limits::RECOMMENDATION_SLICE};
use crate::models::Anime;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error("Failed to encode schedule: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Advisor unavailable: {0}")]
    Unavailable(String),
}

/// Text-generation capability the bridge forwards prompts to.
#[async_trait::async_trait]
pub trait Advisor: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: Option<f32>) -> Result<String, AdvisorError>;
}

#[async_trait::async_trait]
impl Advisor for GeminiClient {
    async fn generate(&self, prompt: &str, temperature: Option<f32>) -> Result<String, AdvisorError> {
        Ok(Self::generate(self, prompt, temperature).await?)
    }
}

/// The first `limit` entries of `schedule`, never more than the advisor cap.
#[must_use]
pub fn schedule_slice(schedule: &[Anime], limit: usize) -> &[Anime] {
    &schedule[..schedule.len().min(limit).min(RECOMMENDATION_SLICE)]
}

pub struct RecommendationBridge {
    advisor: Arc<dyn Advisor>,
    temperature: f32,
    busy: AtomicBool,
}

impl RecommendationBridge {
    #[must_use]
    pub fn new(advisor: Arc<dyn Advisor>, temperature: f32) -> Self {
        Self {
            advisor,
            temperature,
            busy: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Asks the advisor to pick from `schedule` for the user's stated mood.
    pub async fn recommend(&self, schedule: &[Anime], user_prompt: &str) -> String {
        match self.try_recommend(schedule, user_prompt).await {
            Ok(text) => {
                metrics::counter!("aniflow_recommendations_total", "outcome" => "success")
                    .increment(1);
                text
            }
            Err(e) => {
                metrics::counter!("aniflow_recommendations_total", "outcome" => "fallback")
                    .increment(1);
                warn!(error = %e, "Recommendation failed, using fallback");
                fallback::RECOMMENDATION.to_string()
            }
        }
    }

    async fn try_recommend(&self, schedule: &[Anime], user_prompt: &str) -> Result<String, AdvisorError> {
        let encoded = serde_json::to_string(schedule)?;
        let prompt = format!(
            "Given the following anime schedule: {encoded}.\n\
             The user says: \"{user_prompt}\".\n\
             Recommend the best anime from the list for them today. Explain why based on genres and themes.\n\
             Return the response in a friendly, conversational tone."
        );

        debug!(titles = schedule.len(), "Requesting recommendation");
        self.advisor.generate(&prompt, Some(self.temperature)).await
    }

    /// Single-flight entry point. Returns `None` without contacting the advisor
    /// when the prompt is blank or another request is still running.
    pub async fn request(&self, schedule: &[Anime], user_prompt: &str) -> Option<String> {
        if user_prompt.trim().is_empty() {
            return None;
        }

        let _guard = BusyGuard::acquire(&self.busy)?;
        Some(self.recommend(schedule, user_prompt).await)
    }

    /// Short spoiler-free hype summary for `title`.
    pub async fn summarize(&self, title: &str) -> String {
        let prompt = format!(
            "Provide a short, 2-sentence spoiler-free hype summary for the anime \"{title}\". \
             Focus on the stakes and unique premise."
        );

        match self.advisor.generate(&prompt, None).await {
            Ok(text) => text,
            Err(e) => {
                warn!(title, error = %e, "Summary failed, using fallback");
                fallback::SUMMARY.to_string()
            }
        }
    }
}

/// Clears the busy flag when dropped, including on cancellation.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::schedule::placeholder_schedule;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedAdvisor {
        reply: Option<String>,
        delay: Option<Duration>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Advisor for ScriptedAdvisor {
        async fn generate(&self, prompt: &str, _temperature: Option<f32>) -> Result<String, AdvisorError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply
                .clone()
                .ok_or_else(|| AdvisorError::Unavailable("offline".to_string()))
        }
    }

    fn bridge(advisor: ScriptedAdvisor) -> (Arc<ScriptedAdvisor>, RecommendationBridge) {
        let advisor = Arc::new(advisor);
        let bridge = RecommendationBridge::new(advisor.clone(), 0.7);
        (advisor, bridge)
    }

    #[tokio::test]
    async fn failing_advisor_returns_fallback() {
        let (_, bridge) = bridge(ScriptedAdvisor::default());
        let schedule = placeholder_schedule(0).airing;

        let answer = bridge.recommend(&schedule, "something dark").await;
        assert_eq!(
            answer,
            "I couldn't generate a recommendation right now. Why not try watching the highest rated one?"
        );
    }

    #[tokio::test]
    async fn prompt_carries_schedule_and_intent() {
        let (advisor, bridge) = bridge(ScriptedAdvisor {
            reply: Some("Watch Bleach.".to_string()),
            ..ScriptedAdvisor::default()
        });
        let schedule = placeholder_schedule(0).airing;

        assert_eq!(bridge.recommend(&schedule, "sword fights").await, "Watch Bleach.");

        let prompts = advisor.prompts.lock().unwrap();
        assert!(prompts[0].contains("\"sword fights\""));
        assert!(prompts[0].contains("Bleach: Thousand-Year Blood War"));
    }

    #[tokio::test]
    async fn summary_falls_back() {
        let (_, bridge) = bridge(ScriptedAdvisor::default());
        assert_eq!(
            bridge.summarize("Frieren").await,
            "An epic journey awaits you in this season's latest release."
        );
    }

    #[tokio::test]
    async fn blank_prompt_is_a_no_op() {
        let (advisor, bridge) = bridge(ScriptedAdvisor::default());
        assert_eq!(bridge.request(&[], "   ").await, None);
        assert!(advisor.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn second_request_while_busy_is_ignored() {
        let (advisor, bridge) = bridge(ScriptedAdvisor {
            reply: Some("ok".to_string()),
            delay: Some(Duration::from_secs(2)),
            ..ScriptedAdvisor::default()
        });
        let bridge = Arc::new(bridge);

        let first = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.request(&[], "first").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(bridge.is_busy());

        assert_eq!(bridge.request(&[], "second").await, None);
        assert_eq!(first.await.unwrap(), Some("ok".to_string()));
        assert!(!bridge.is_busy());
        assert_eq!(advisor.prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn slice_is_capped() {
        let mut schedule = Vec::new();
        for _ in 0..4 {
            schedule.extend(placeholder_schedule(0).airing);
        }
        assert_eq!(schedule_slice(&schedule, 100).len(), 15);
        assert_eq!(schedule_slice(&schedule, 3).len(), 3);
        assert!(schedule_slice(&[], 15).is_empty());
    }
}
