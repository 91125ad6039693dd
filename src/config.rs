use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub anilist: AnilistConfig,

    pub schedule: ScheduleConfig,

    pub search: SearchConfig,

    pub advisor: AdvisorConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            suppress_connection_errors: false,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnilistConfig {
    pub endpoint: String,

    /// Request timeout in seconds (default: 15)
    pub request_timeout_seconds: u64,

    pub user_agent: String,
}

impl Default for AnilistConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://graphql.anilist.co".to_string(),
            request_timeout_seconds: 15,
            user_agent: format!("AniFlow/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub airing_page_size: u32,

    pub past_page_size: u32,

    pub upcoming_page_size: u32,

    /// Length of the trailing "past broadcasts" window. Independent of the week offset.
    pub past_window_days: i64,

    /// Show placeholder titles instead of an empty grid when a fetch fails.
    pub placeholder_on_failure: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            airing_page_size: 100,
            past_page_size: 25,
            upcoming_page_size: 80,
            past_window_days: crate::constants::limits::PAST_WINDOW_DAYS,
            placeholder_on_failure: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,

    pub min_query_chars: usize,

    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: crate::constants::intervals::SEARCH_DEBOUNCE_MS,
            min_query_chars: crate::constants::limits::MIN_SEARCH_CHARS,
            max_results: crate::constants::limits::MAX_SEARCH_RESULTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub endpoint: String,

    pub model: String,

    /// Falls back to `GEMINI_API_KEY`, then `API_KEY`, when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub temperature: f32,

    /// How many airing titles are handed to the advisor.
    pub schedule_slice: usize,

    pub request_timeout_seconds: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key: None,
            temperature: 0.7,
            schedule_slice: crate::constants::limits::RECOMMENDATION_SLICE,
            request_timeout_seconds: 30,
        }
    }
}

impl AdvisorConfig {
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("aniflow").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".aniflow").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.anilist.endpoint)
            .with_context(|| format!("Invalid AniList endpoint: {}", self.anilist.endpoint))?;

        url::Url::parse(&self.advisor.endpoint)
            .with_context(|| format!("Invalid advisor endpoint: {}", self.advisor.endpoint))?;

        if self.anilist.request_timeout_seconds == 0 || self.advisor.request_timeout_seconds == 0 {
            anyhow::bail!("Request timeouts must be > 0");
        }

        if self.search.min_query_chars == 0 {
            anyhow::bail!("search.min_query_chars must be at least 1");
        }

        if self.search.max_results == 0 {
            anyhow::bail!("search.max_results must be at least 1");
        }

        if self.schedule.past_window_days < 1 {
            anyhow::bail!("schedule.past_window_days must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.debounce_ms, 400);
        assert_eq!(config.search.min_query_chars, 2);
        assert_eq!(config.search.max_results, 12);
        assert_eq!(config.schedule.past_window_days, 3);
        assert_eq!(config.advisor.schedule_slice, 15);
        assert_eq!(config.anilist.endpoint, "https://graphql.anilist.co");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[anilist]"));
        assert!(toml_str.contains("[search]"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [search]
            debounce_ms = 250
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.search.debounce_ms, 250);

        assert_eq!(config.search.max_results, 12);
        assert_eq!(config.schedule.airing_page_size, 100);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.search.min_query_chars = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.anilist.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!(
            "aniflow-config-test-{}.toml",
            uuid::Uuid::new_v4()
        ));
        let mut config = Config::default();
        config.server.port = 7000;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.server.port, 7000);
        let _ = std::fs::remove_file(path);
    }
}
