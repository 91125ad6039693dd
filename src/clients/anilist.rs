use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::AnilistConfig;

/// Fields requested for every media record, whichever query it comes from.
const MEDIA_FIELDS: &str = r"
    id
    title { english romaji }
    coverImage { extraLarge large }
    bannerImage
    genres
    description
    averageScore
    trailer { id site }
    externalLinks { site url }
    studios(isMain: true) { nodes { name } }
    relations {
        nodes {
            id
            type
            title { english romaji }
            coverImage { large }
        }
    }
";

#[derive(Debug, Error)]
pub enum AnilistError {
    #[error("AniList transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AniList data error: {0}")]
    DataShape(String),
}

#[derive(Serialize)]
struct GraphQLRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphQLResponse<D> {
    data: Option<D>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaRecord {
    pub id: i32,
    pub title: MediaTitle,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<CoverImage>,
    #[serde(rename = "bannerImage")]
    pub banner_image: Option<String>,
    pub genres: Option<Vec<String>>,
    pub description: Option<String>,
    #[serde(rename = "averageScore")]
    pub average_score: Option<i32>,
    pub trailer: Option<MediaTrailer>,
    #[serde(rename = "externalLinks")]
    pub external_links: Option<Vec<MediaExternalLink>>,
    pub studios: Option<Connection<StudioNode>>,
    pub relations: Option<Connection<RelationNode>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaTitle {
    pub english: Option<String>,
    pub romaji: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoverImage {
    #[serde(rename = "extraLarge")]
    pub extra_large: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaTrailer {
    pub id: Option<String>,
    pub site: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaExternalLink {
    pub site: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioNode {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelationNode {
    pub id: i32,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub title: MediaTitle,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<CoverImage>,
}

/// One airing slot: a media record bound to an episode and a timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct AiringSlot {
    #[serde(rename = "airingAt")]
    pub airing_at: i64,
    pub episode: i32,
    pub media: MediaRecord,
}

/// Epoch-second bounds and page sizes for the composite schedule query.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleVariables<'a> {
    pub airing_start: i64,
    pub airing_end: i64,
    pub airing_per_page: u32,
    pub past_start: i64,
    pub past_end: i64,
    pub past_per_page: u32,
    pub upcoming_season: &'a str,
    pub upcoming_year: i32,
    pub upcoming_per_page: u32,
}

#[derive(Debug, Default)]
pub struct SchedulePages {
    pub airing: Vec<AiringSlot>,
    pub past: Vec<AiringSlot>,
    pub upcoming: Vec<MediaRecord>,
}

#[derive(Deserialize)]
struct SchedulePagesData {
    airing: Option<SlotPage>,
    past: Option<SlotPage>,
    upcoming: Option<MediaPage>,
}

#[derive(Deserialize)]
struct SlotPage {
    #[serde(rename = "airingSchedules")]
    airing_schedules: Option<Vec<AiringSlot>>,
}

#[derive(Deserialize)]
struct MediaPage {
    media: Option<Vec<MediaRecord>>,
}

#[derive(Clone)]
pub struct AnilistClient {
    client: Client,
    endpoint: String,
}

impl Default for AnilistClient {
    fn default() -> Self {
        Self::new(&AnilistConfig::default())
    }
}

impl AnilistClient {
    #[must_use]
    pub fn new(config: &AnilistConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(config.user_agent.as_str())
                .timeout(Duration::from_secs(config.request_timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Airing slots in the week window, recent broadcasts and the upcoming
    /// season browse, all in one round trip.
    pub async fn fetch_schedule_pages(
        &self,
        variables: ScheduleVariables<'_>,
    ) -> Result<SchedulePages, AnilistError> {
        let query = format!(
            r"
            query (
                $airingStart: Int, $airingEnd: Int, $airingPerPage: Int,
                $pastStart: Int, $pastEnd: Int, $pastPerPage: Int,
                $upcomingSeason: MediaSeason, $upcomingYear: Int, $upcomingPerPage: Int
            ) {{
                airing: Page(page: 1, perPage: $airingPerPage) {{
                    airingSchedules(airingAt_greater: $airingStart, airingAt_lesser: $airingEnd, sort: TIME) {{
                        airingAt
                        episode
                        media {{ {MEDIA_FIELDS} }}
                    }}
                }}
                past: Page(page: 1, perPage: $pastPerPage) {{
                    airingSchedules(airingAt_greater: $pastStart, airingAt_lesser: $pastEnd, sort: TIME_DESC) {{
                        airingAt
                        episode
                        media {{ {MEDIA_FIELDS} }}
                    }}
                }}
                upcoming: Page(page: 1, perPage: $upcomingPerPage) {{
                    media(season: $upcomingSeason, seasonYear: $upcomingYear, status: NOT_YET_RELEASED, sort: POPULARITY_DESC, type: ANIME) {{
                        {MEDIA_FIELDS}
                    }}
                }}
            }}
            "
        );

        let data: SchedulePagesData = self.post(&query, variables).await?;

        Ok(SchedulePages {
            airing: data
                .airing
                .and_then(|p| p.airing_schedules)
                .unwrap_or_default(),
            past: data
                .past
                .and_then(|p| p.airing_schedules)
                .unwrap_or_default(),
            upcoming: data.upcoming.and_then(|p| p.media).unwrap_or_default(),
        })
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<MediaRecord>, AnilistError> {
        #[derive(Serialize)]
        struct IdVar {
            id: i32,
        }

        #[derive(Deserialize)]
        struct MediaWrapper {
            #[serde(rename = "Media")]
            media: Option<MediaRecord>,
        }

        let query =
            format!("query ($id: Int) {{ Media(id: $id, type: ANIME) {{ {MEDIA_FIELDS} }} }}");

        let data: MediaWrapper = self.post(&query, IdVar { id }).await?;
        Ok(data.media)
    }

    pub async fn search_media(
        &self,
        search: &str,
        per_page: u32,
    ) -> Result<Vec<MediaRecord>, AnilistError> {
        #[derive(Serialize)]
        struct SearchVars<'a> {
            q: &'a str,
            #[serde(rename = "perPage")]
            per_page: u32,
        }

        #[derive(Deserialize)]
        struct PageWrapper {
            #[serde(rename = "Page")]
            page: Option<MediaPage>,
        }

        let query = format!(
            "query ($q: String, $perPage: Int) {{ Page(perPage: $perPage) {{ media(search: $q, type: ANIME) {{ {MEDIA_FIELDS} }} }} }}"
        );

        let data: PageWrapper = self
            .post(
                &query,
                SearchVars {
                    q: search,
                    per_page,
                },
            )
            .await?;

        Ok(data.page.and_then(|p| p.media).unwrap_or_default())
    }

    async fn post<V: Serialize + Send, D: DeserializeOwned>(
        &self,
        query: &str,
        variables: V,
    ) -> Result<D, AnilistError> {
        let request_body = GraphQLRequest { query, variables };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, bytes = body.len(), "AniList response received");

        let parsed: GraphQLResponse<D> = serde_json::from_str(&body).map_err(|e| {
            AnilistError::DataShape(format!("Unreadable response ({status}): {e}"))
        })?;

        if let Some(errors) = parsed.errors
            && !errors.is_empty()
        {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AnilistError::DataShape(message));
        }

        if !status.is_success() {
            return Err(AnilistError::DataShape(format!("HTTP {status}")));
        }

        parsed
            .data
            .ok_or_else(|| AnilistError::DataShape("Response carried no data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_record_tolerates_missing_fields() {
        let json = serde_json::json!({
            "id": 7,
            "title": { "romaji": "Nanatsu" },
            "coverImage": { "large": "l.png" },
            "averageScore": null,
            "studios": { "nodes": [] }
        });
        let media: MediaRecord = serde_json::from_value(json).unwrap();
        assert_eq!(media.id, 7);
        assert_eq!(media.title.romaji.as_deref(), Some("Nanatsu"));
        assert!(media.title.english.is_none());
        assert!(media.genres.is_none());
        assert!(media.studios.unwrap().nodes.is_empty());
    }

    #[test]
    fn schedule_variables_use_graphql_names() {
        let vars = ScheduleVariables {
            airing_start: 1,
            airing_end: 2,
            airing_per_page: 100,
            past_start: 3,
            past_end: 4,
            past_per_page: 25,
            upcoming_season: "WINTER",
            upcoming_year: 2027,
            upcoming_per_page: 80,
        };
        let value = serde_json::to_value(vars).unwrap();
        assert_eq!(value["airingStart"], 1);
        assert_eq!(value["upcomingSeason"], "WINTER");
        assert_eq!(value["pastPerPage"], 25);
    }
}
