pub mod api;
pub mod core;
pub mod extraction;
pub mod providers;
pub mod reasoner;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::core::config::{AppConfig, APP_VERSION};
use crate::core::errors::{AppError, AppResult};
use crate::providers::{gemini::GeminiClient, LlmProvider};
use crate::reasoner::executor::ChronologyExecutor;

fn log_level_from_env() -> &'static str {
    match std::env::var("CHRONOLOGY_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `CHRONOLOGY_LOG` when
/// both are set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},tower_http={level},hyper=warn,reqwest=warn",
            level = log_level_from_env()
        ))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub executor: ChronologyExecutor,
}

impl AppState {
    pub fn new(config: AppConfig, provider: Arc<dyn LlmProvider>) -> Self {
        let executor = ChronologyExecutor::new(provider, config.max_document_chars);
        Self {
            config: Arc::new(config),
            executor,
        }
    }
}

pub async fn run(config: AppConfig) -> AppResult<()> {
    let gemini = GeminiClient::new(&config)?;
    tracing::info!(
        model = gemini.model(),
        relay = gemini.uses_relay(),
        "model provider configured"
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, Arc::new(gemini));
    let app = api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Config(format!("cannot bind {bind_addr}: {err}")))?;
    tracing::info!(addr = %bind_addr, version = APP_VERSION, "chronology server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("chronology server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
