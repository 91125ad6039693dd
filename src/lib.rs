pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod models;
pub mod services;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{
    Cli, Commands, cmd_anime_info, cmd_past, cmd_recommend, cmd_schedule, cmd_search_anime,
    cmd_season, cmd_summary,
};
pub use config::Config;

/// Installs the global subscriber. `RUST_LOG` overrides `general.log_level`.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.general.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("Tracing already initialized: {e}");
    }
}

/// Loads variables from `.env` into the process environment, if present.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to read .env file: {e}");
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    init_tracing(&config);

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        return cmd_schedule(&config, 0, None, "All", "airing", false).await;
    };

    match command {
        Commands::Schedule {
            week,
            day,
            genre,
            mode,
            all,
        } => cmd_schedule(&config, week, day.as_deref(), &genre, &mode, all).await,

        Commands::Past => cmd_past(&config).await,

        Commands::Search { query } => cmd_search_anime(&config, &query.join(" ")).await,

        Commands::Info { id } => cmd_anime_info(&config, id).await,

        Commands::Season => {
            cmd_season(&config);
            Ok(())
        }

        Commands::Recommend { prompt, week } => {
            cmd_recommend(&config, &prompt.join(" "), week).await
        }

        Commands::Summary { title } => {
            cmd_summary(&config, &title.join(" ")).await;
            Ok(())
        }

        Commands::Serve => run_server(config).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("Created config.toml");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    if config.advisor.resolved_api_key().is_none() {
        warn!("No Gemini API key configured, recommendations will use the fallback text");
    }

    let port = config.server.port;
    let state = api::create_app_state(config, prometheus_handle);
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 API server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;

    Ok(())
}
