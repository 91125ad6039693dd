use std::sync::Arc;

use crate::clients::gemini::GeminiClient;
use crate::config::Config;
use crate::services::{
    AnilistScheduleSource, RecommendationBridge, ScheduleSource, fetch_or_placeholder,
    schedule_slice,
};

fn bridge(config: &Config) -> RecommendationBridge {
    RecommendationBridge::new(
        Arc::new(GeminiClient::new(&config.advisor)),
        config.advisor.temperature,
    )
}

pub async fn cmd_recommend(config: &Config, prompt: &str, week: i32) -> anyhow::Result<()> {
    let source: Arc<dyn ScheduleSource> = Arc::new(AnilistScheduleSource::from_config(config));
    let (bundle, _) =
        fetch_or_placeholder(&source, week, config.schedule.placeholder_on_failure).await?;
    let slice = schedule_slice(&bundle.airing, config.advisor.schedule_slice);

    println!("Analyzing {} broadcasts...", slice.len());
    println!();

    match bridge(config).request(slice, prompt).await {
        Some(answer) => println!("{answer}"),
        None => println!("Tell me what you are in the mood for."),
    }

    Ok(())
}

pub async fn cmd_summary(config: &Config, title: &str) {
    let summary = bridge(config).summarize(title).await;
    println!("{title}");
    println!("{:-<60}", "");
    println!("{summary}");
}
