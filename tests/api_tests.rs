use aniflow::api::{AppState, router};
use aniflow::config::Config;
use aniflow::models::Anime;
use aniflow::services::{
    Advisor, AdvisorError, ScheduleBundle, ScheduleError, ScheduleSource, placeholder_schedule,
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct FakeSource {
    bundle: Option<ScheduleBundle>,
}

#[async_trait::async_trait]
impl ScheduleSource for FakeSource {
    async fn fetch_all_schedules(&self, _week_offset: i32) -> Result<ScheduleBundle, ScheduleError> {
        self.bundle
            .clone()
            .ok_or_else(|| ScheduleError::Transport("connection refused".to_string()))
    }

    async fn fetch_anime_by_id(&self, id: i32) -> Option<Anime> {
        self.bundle
            .as_ref()?
            .airing
            .iter()
            .find(|a| a.source_id == id)
            .cloned()
    }

    async fn search_anime(&self, query: &str) -> Vec<Anime> {
        self.bundle
            .iter()
            .flat_map(|b| b.airing.iter())
            .filter(|a| a.title.to_lowercase().contains(&query.to_lowercase()))
            .cloned()
            .collect()
    }
}

struct FakeAdvisor {
    reply: Option<&'static str>,
    delay: Duration,
}

impl FakeAdvisor {
    fn replying(reply: &'static str) -> Self {
        Self {
            reply: Some(reply),
            delay: Duration::ZERO,
        }
    }
}

#[async_trait::async_trait]
impl Advisor for FakeAdvisor {
    async fn generate(&self, _prompt: &str, _temperature: Option<f32>) -> Result<String, AdvisorError> {
        tokio::time::sleep(self.delay).await;
        self.reply
            .map(ToString::to_string)
            .ok_or_else(|| AdvisorError::Unavailable("quota".to_string()))
    }
}

/// A bundle where every title airs on Wednesday, plus one duplicate slot.
fn wednesday_bundle() -> ScheduleBundle {
    let mut bundle = placeholder_schedule(1_000);
    for anime in &mut bundle.airing {
        anime.airing_weekday = 3;
    }
    let mut repeat = bundle.airing[0].clone();
    repeat.id = "repeat".to_string();
    bundle.airing.push(repeat);
    bundle.upcoming = placeholder_schedule(0).airing.into_iter().take(2).collect();
    bundle
}

fn app_with(bundle: Option<ScheduleBundle>, advisor: FakeAdvisor, config: Config) -> Router {
    let state = AppState::new(
        config,
        Arc::new(FakeSource { bundle }),
        Arc::new(advisor),
        None,
    );
    router(Arc::new(state))
}

fn app(bundle: Option<ScheduleBundle>) -> Router {
    app_with(bundle, FakeAdvisor::replying("Watch Bleach."), Config::default())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_schedule_returns_bundle() {
    let (status, body) = send(app(Some(wednesday_bundle())), get("/api/schedule?week_offset=1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["airing"].as_array().unwrap().len(), 6);
    assert_eq!(body["data"]["upcoming"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_schedule_failure_is_bad_gateway() {
    let (status, body) = send(app(None), get("/api/schedule")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "AniList service is unavailable");
}

#[tokio::test]
async fn test_view_filters_and_dedups() {
    let (status, body) = send(
        app(Some(wednesday_bundle())),
        get("/api/view?weekday=wednesday&visible=3"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total"], 5);
    assert_eq!(data["has_more"], true);
    assert_eq!(data["placeholder"], false);
    assert_eq!(data["week_label"], "Current Week");
    assert_eq!(data["items"].as_array().unwrap().len(), 3);
    assert_eq!(data["items"][0]["title"], "Blue Lock: VS. U-20 JAPAN");
    assert_eq!(data["items"][0]["score_label"], "8.4");
}

#[tokio::test]
async fn test_view_genre_and_mode() {
    let (_, body) = send(
        app(Some(wednesday_bundle())),
        get("/api/view?weekday=3&genre=Sports"),
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["genre"], "Sports");

    let (_, body) = send(
        app(Some(wednesday_bundle())),
        get("/api/view?mode=upcoming&weekday=0&week_offset=-1"),
    )
    .await;
    assert_eq!(body["data"]["mode"], "upcoming");
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["week_label"], "1 Week Prior");
}

#[tokio::test]
async fn test_view_rejects_unknown_genre() {
    let (status, body) = send(app(Some(wednesday_bundle())), get("/api/view?genre=action")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown genre 'action'");
}

#[tokio::test]
async fn test_view_uses_placeholder_when_fetch_fails() {
    let (status, body) = send(app(None), get("/api/view?weekday=6")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["placeholder"], true);
    // Blue Lock and Bleach air on Saturday in the placeholder list
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_view_without_placeholder_surfaces_error() {
    let mut config = Config::default();
    config.schedule.placeholder_on_failure = false;
    let app = app_with(None, FakeAdvisor::replying("unused"), config);

    let (status, _) = send(app, get("/api/view")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_search_respects_min_length() {
    let (_, body) = send(app(Some(wednesday_bundle())), get("/api/search?q=b")).await;
    assert_eq!(body["data"], json!([]));

    let (_, body) = send(app(Some(wednesday_bundle())), get("/api/search?q=bleach")).await;
    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Bleach: Thousand-Year Blood War");
}

#[tokio::test]
async fn test_anime_by_id() {
    let (status, body) = send(app(Some(wednesday_bundle())), get("/api/anime/100003")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["studio"], "Pierrot");

    let (status, body) = send(app(Some(wednesday_bundle())), get("/api/anime/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Anime 1 not found");
}

#[tokio::test]
async fn test_season_info() {
    let (status, body) = send(app(None), get("/api/season")).await;

    assert_eq!(status, StatusCode::OK);
    let season = body["data"]["current"]["season"].as_str().unwrap();
    assert!(["WINTER", "SPRING", "SUMMER", "FALL"].contains(&season));
    assert!(body["data"]["upcoming"]["month_name"].is_string());
}

#[tokio::test]
async fn test_recommend() {
    let (status, body) = send(
        app(Some(wednesday_bundle())),
        post_json("/api/recommend", &json!({ "prompt": "sports anime" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recommendation"], "Watch Bleach.");
}

#[tokio::test]
async fn test_recommend_blank_prompt_is_rejected() {
    let (status, _) = send(
        app(Some(wednesday_bundle())),
        post_json("/api/recommend", &json!({ "prompt": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_failure_returns_fallback() {
    let advisor = FakeAdvisor {
        reply: None,
        delay: Duration::ZERO,
    };
    let app = app_with(Some(wednesday_bundle()), advisor, Config::default());

    let (status, body) = send(app, post_json("/api/recommend", &json!({ "prompt": "mecha" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["recommendation"],
        "I couldn't generate a recommendation right now. Why not try watching the highest rated one?"
    );
}

#[tokio::test]
async fn test_concurrent_recommend_conflicts() {
    let advisor = FakeAdvisor {
        reply: Some("slow answer"),
        delay: Duration::from_millis(300),
    };
    let app = app_with(Some(wednesday_bundle()), advisor, Config::default());

    let first = tokio::spawn(send(
        app.clone(),
        post_json("/api/recommend", &json!({ "prompt": "first" })),
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (status, _) = send(app, post_json("/api/recommend", &json!({ "prompt": "second" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recommendation"], "slow answer");
}

#[tokio::test]
async fn test_summary() {
    let (status, body) = send(
        app(None),
        post_json("/api/summary", &json!({ "title": "Frieren" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"], "Watch Bleach.");
}

#[tokio::test]
async fn test_metrics_disabled_message() {
    let response = app(None).oneshot(get("/api/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Metrics are disabled");
}
