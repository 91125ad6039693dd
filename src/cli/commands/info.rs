use crate::config::Config;
use crate::services::{AnilistScheduleSource, ScheduleSource};

pub async fn cmd_anime_info(config: &Config, id: i32) -> anyhow::Result<()> {
    let source = AnilistScheduleSource::from_config(config);

    let Some(anime) = source.fetch_anime_by_id(id).await else {
        println!("Anime with ID {id} not found.");
        return Ok(());
    };

    println!("Anime Info");
    println!("{:-<60}", "");
    println!("Title:    {}", anime.title);
    println!("ID:       {}", anime.source_id);
    println!("Score:    {}", anime.score_label());
    println!("Studio:   {}", anime.studio);
    if !anime.genres.is_empty() {
        println!("Genres:   {}", anime.genres.join(", "));
    }
    if let Some(url) = anime.trailer.as_ref().map(crate::models::Trailer::watch_url) {
        println!("Trailer:  {url}");
    }

    println!();
    println!("{}", anime.description);

    if !anime.relations.is_empty() {
        println!();
        println!("Related:");
        for relation in &anime.relations {
            println!("  • {} [{}] (ID: {})", relation.title, relation.relation_type, relation.id);
        }
    }

    if !anime.external_links.is_empty() {
        println!();
        println!("Links:");
        for link in &anime.external_links {
            println!("  • {}: {}", link.site, link.url);
        }
    }

    println!();
    Ok(())
}
