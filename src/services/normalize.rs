//! Conversion of upstream media records into the canonical [`Anime`] shape.

use chrono::{DateTime, Datelike, TimeZone};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::clients::anilist::{CoverImage, MediaRecord, MediaTitle, RelationNode};
use crate::constants::{DEFAULT_DESCRIPTION, TIME_PLACEHOLDER, UNKNOWN_STUDIO};
use crate::models::{Anime, ExternalLink, Relation, Trailer};

/// Builds an [`Anime`] from a media record and an optional airing slot.
///
/// `airing_at` and `episode` of `None` or `0` both mean "not an airing slot".
/// The weekday and time-of-day are computed in `tz`, so the same input always
/// yields the same record for a given zone.
#[must_use]
pub fn normalize<Tz>(
    media: &MediaRecord,
    airing_at: Option<i64>,
    episode: Option<i32>,
    tz: &Tz,
) -> Anime
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let airing_at = airing_at.unwrap_or(0);
    let episode = episode.unwrap_or(0).max(0);

    let (airing_weekday, airing_time_display) = airing_fields(airing_at, tz);

    Anime {
        id: format!("{}-{}-{}", media.id, airing_at, episode),
        source_id: media.id,
        title: pick_title(&media.title),
        image: pick_image(media.cover_image.as_ref()),
        banner: media.banner_image.clone().filter(|b| !b.is_empty()),
        airing_weekday,
        airing_time_display,
        raw_airing_time: airing_at,
        genres: media.genres.clone().unwrap_or_default(),
        description: clean_description(media.description.as_deref()),
        episode_number: episode,
        score: scale_score(media.average_score),
        studio: media
            .studios
            .as_ref()
            .and_then(|s| s.nodes.first())
            .map(|n| n.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_STUDIO.to_string()),
        trailer: media.trailer.as_ref().and_then(|t| {
            Some(Trailer {
                id: t.id.clone()?,
                site: t.site.clone()?,
            })
        }),
        external_links: media
            .external_links
            .iter()
            .flatten()
            .filter_map(|l| {
                Some(ExternalLink {
                    site: l.site.clone()?,
                    url: l.url.clone()?,
                })
            })
            .collect(),
        relations: media
            .relations
            .iter()
            .flat_map(|r| r.nodes.iter())
            .map(normalize_relation)
            .collect(),
    }
}

fn normalize_relation(node: &RelationNode) -> Relation {
    Relation {
        id: node.id,
        title: pick_title(&node.title),
        relation_type: node.media_type.clone().unwrap_or_default(),
        image: node
            .cover_image
            .as_ref()
            .and_then(|c| c.large.clone())
            .unwrap_or_default(),
    }
}

fn airing_fields<Tz>(airing_at: i64, tz: &Tz) -> (u8, String)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if airing_at == 0 {
        return (0, TIME_PLACEHOLDER.to_string());
    }

    DateTime::from_timestamp(airing_at, 0).map_or_else(
        || (0, TIME_PLACEHOLDER.to_string()),
        |utc| {
            let local = utc.with_timezone(tz);
            #[allow(clippy::cast_possible_truncation)]
            let weekday = local.weekday().num_days_from_sunday() as u8;
            (weekday, local.format("%-I:%M %p").to_string())
        },
    )
}

fn pick_title(title: &MediaTitle) -> String {
    title
        .english
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(title.romaji.as_deref())
        .unwrap_or_default()
        .to_string()
}

fn pick_image(cover: Option<&CoverImage>) -> String {
    cover
        .and_then(|c| {
            c.extra_large
                .as_deref()
                .filter(|u| !u.is_empty())
                .or(c.large.as_deref())
        })
        .unwrap_or_default()
        .to_string()
}

/// Upstream scores run 0-100; records keep 0-10 with 0 meaning unrated.
#[allow(clippy::cast_precision_loss)]
fn scale_score(average_score: Option<i32>) -> f32 {
    average_score.map_or(0.0, |s| (s as f32 / 10.0).clamp(0.0, 10.0))
}

/// Decodes entities, removes markup and trims; empty input gets the default text.
#[must_use]
pub fn clean_description(raw: Option<&str>) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>?").expect("Invalid regex"));

    let decoded = raw.map(html_escape::decode_html_entities).unwrap_or_default();
    let stripped = re.replace_all(&decoded, "");
    let trimmed = stripped.trim();

    if trimmed.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        trimmed.to_string()
    }
}
