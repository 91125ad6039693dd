use std::sync::Arc;

use crate::config::Config;
use crate::services::{AnilistScheduleSource, ScheduleSource, SearchPipeline};

pub async fn cmd_search_anime(config: &Config, query: &str) -> anyhow::Result<()> {
    if query.chars().count() < config.search.min_query_chars {
        println!(
            "Query too short, type at least {} characters.",
            config.search.min_query_chars
        );
        return Ok(());
    }

    println!("Searching for: {query}");

    let source: Arc<dyn ScheduleSource> = Arc::new(AnilistScheduleSource::from_config(config));
    let pipeline = SearchPipeline::new(source, &config.search);
    pipeline.input(query).await;
    let snapshot = pipeline.settle().await;

    if snapshot.results.is_empty() {
        println!("No anime found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for anime in &snapshot.results {
        println!("• {} (★ {})", anime.title, anime.score_label());
        if !anime.genres.is_empty() {
            println!("  {}", anime.genres.join(", "));
        }
        println!("  Studio: {} | ID: {}", anime.studio, anime.source_id);
        println!();
    }

    println!("For details: aniflow info <ID>");

    Ok(())
}
