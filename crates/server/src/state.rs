//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the configuration, the
//! database provider and the answer pipeline, making them accessible to all
//! request handlers.

use crate::config::{AppConfig, ProviderConfig};
use kidcare::{
    constants::DEFAULT_GEMINI_BASE_URL,
    generation::GenerationClient,
    pipeline::AnswerPipeline,
    providers::{
        ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider},
        db::sqlite::SqliteProvider,
    },
};
use std::{path::Path, sync::Arc, time::Duration};
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The database provider backing FAQs, the question log and feedback.
    pub sqlite_provider: Arc<SqliteProvider>,
    pub pipeline: Arc<AnswerPipeline>,
}

/// Instantiates the generative provider described by the `provider` section.
pub fn build_ai_provider(config: &ProviderConfig) -> anyhow::Result<Box<dyn AiProvider>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| anyhow::anyhow!("api_key is required for the gemini provider"))?;
            let base_url = config
                .api_url
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
            Box::new(GeminiProvider::new(base_url, api_key, timeout)?)
        }
        "local" => {
            // For local providers, the URL is always required.
            let api_url = config.api_url.clone().filter(|url| !url.is_empty()).ok_or_else(|| {
                anyhow::anyhow!(
                    "api_url is required for the local provider. Please set LOCAL_AI_API_URL in your .env file."
                )
            })?;
            Box::new(LocalAiProvider::new(
                api_url,
                config.api_key.clone().filter(|key| !key.is_empty()),
                timeout,
            )?)
        }
        other => {
            return Err(anyhow::anyhow!("Unsupported AI provider type '{other}'"));
        }
    };
    Ok(provider)
}

/// Builds the shared application state from the configuration.
///
/// This function initializes all necessary services:
/// - It instantiates the configured AI provider.
/// - It opens the SQLite database, ensures the schema exists and seeds the FAQ
///   table from `faq_seed_file` when the table is empty.
/// - It assembles the answer pipeline on top of both.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let ai_provider = build_ai_provider(&config.provider)?;
    info!(
        provider = ai_provider.name(),
        models = ?config.provider.models,
        "Initialized AI provider."
    );

    if let Some(parent) = Path::new(&config.db_url).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");
    // Ensure the database schema is up-to-date on startup.
    sqlite_provider.initialize_schema().await?;

    if let Some(seed_path) = &config.faq_seed_file {
        let yaml = std::fs::read_to_string(seed_path)
            .map_err(|e| anyhow::anyhow!("Failed to read FAQ seed file '{seed_path}': {e}"))?;
        sqlite_provider.seed_faqs_from_yaml(&yaml).await?;
    }

    let generation = GenerationClient::new(ai_provider, config.generation_settings());
    let pipeline = AnswerPipeline::new(
        Box::new(sqlite_provider.clone()),
        generation,
        config.pipeline_settings(),
    );

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider: Arc::new(sqlite_provider),
        pipeline: Arc::new(pipeline),
    })
}
