//! # Application Configuration
//!
//! This module defines the configuration structure for the `kidcare-server` and
//! provides the logic for loading it from a YAML file and environment
//! variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use kidcare::{
    constants::{
        DEFAULT_CANDIDATE_LIMIT, DEFAULT_DB_FILE, DEFAULT_FAQ_FETCH_LIMIT,
        DEFAULT_MIN_QUESTION_CHARS, DEFAULT_MODELS, DEFAULT_PROVIDER_TIMEOUT_SECS,
    },
    generation::{GenerationSettings, OutputFormat},
    pipeline::PipelineSettings,
    prompts::{
        PromptTemplates, ANSWER_SYSTEM_PROMPT, ANSWER_USER_PROMPT, MINIMAL_ANSWER_USER_PROMPT,
    },
};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// A YAML list of FAQ entries loaded at startup while the table is empty.
    #[serde(default)]
    pub faq_seed_file: Option<String>,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub prompts: PromptsConfig,
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    DEFAULT_DB_FILE.to_string()
}

/// The generative provider and its model chain.
#[derive(Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider ("gemini" or "local").
    pub provider: String,
    /// The API URL. For Gemini this is the versioned API root and defaults to
    /// the public endpoint. For local providers it is the full chat
    /// completions URL and is required.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifiers, tried in order.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// The API key never reaches the logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("models", &self.models)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

/// Sampling and output options for answer generation.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub minimal_max_output_tokens: u32,
    pub candidate_count: u32,
    pub output_format: OutputFormat,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let defaults = GenerationSettings::default();
        Self {
            temperature: defaults.temperature,
            max_output_tokens: defaults.max_output_tokens,
            minimal_max_output_tokens: defaults.minimal_max_output_tokens,
            candidate_count: defaults.candidate_count,
            output_format: defaults.output_format,
        }
    }
}

/// Limits applied by the answer pipeline.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_question_chars: usize,
    pub fetch_limit: u32,
    pub candidate_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_question_chars: DEFAULT_MIN_QUESTION_CHARS,
            fetch_limit: DEFAULT_FAQ_FETCH_LIMIT,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

/// Prompt templates. Defaults come from `kidcare::prompts`.
#[derive(Debug, Deserialize, Clone)]
pub struct PromptsConfig {
    pub system: String,
    pub rich_user: String,
    pub minimal_user: String,
}

impl AppConfig {
    /// Builds the generation client settings from the provider, generation
    /// and prompt sections.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            models: self.provider.models.clone(),
            temperature: self.generation.temperature,
            max_output_tokens: self.generation.max_output_tokens,
            minimal_max_output_tokens: self.generation.minimal_max_output_tokens,
            candidate_count: self.generation.candidate_count,
            output_format: self.generation.output_format,
            templates: PromptTemplates {
                system: self.prompts.system.clone(),
                rich_user: self.prompts.rich_user.clone(),
                minimal_user: self.prompts.minimal_user.clone(),
            },
            ..Default::default()
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            min_question_chars: self.pipeline.min_question_chars,
            fetch_limit: self.pipeline.fetch_limit,
            candidate_limit: self.pipeline.candidate_limit,
        }
    }
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - Top-level keys like `port` and `db_url` are overridden by `PORT` and `DB_URL`.
/// - Nested keys are overridden by `KIDCARE_...` variables (e.g., `KIDCARE_PROVIDER__API_KEY`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults from the library.
        .set_default("prompts.system", ANSWER_SYSTEM_PROMPT)?
        .set_default("prompts.rich_user", ANSWER_USER_PROMPT)?
        .set_default("prompts.minimal_user", MINIMAL_ANSWER_USER_PROMPT)?;

    // Layer 2: Main Config (with Fallback)
    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?
        .ok_or_else(|| ConfigError::NotFound(format!("Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists or your AI_PROVIDER is set to load a valid template ('gemini' or 'local').")))?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    // Layer 3: User Prompt Overrides (Optional)
    let user_prompt_path = format!("{base_path}/prompt.yml");
    if let Some(user_prompts_content) = read_and_substitute(&user_prompt_path)? {
        info!("Loading user prompt overrides from '{user_prompt_path}'.");
        builder = builder.add_source(File::from_str(&user_prompts_content, FileFormat::Yaml));
    }

    let settings = builder
        // Layer 4: Load environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 5: Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("KIDCARE")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // A relative seed path is resolved against the main config file's directory.
    if let Some(seed) = config.faq_seed_file.take().filter(|s| !s.is_empty()) {
        let seed_path = Path::new(&seed);
        config.faq_seed_file = Some(match Path::new(&main_config_path).parent() {
            Some(dir) if seed_path.is_relative() => dir.join(seed_path).to_string_lossy().into_owned(),
            _ => seed,
        });
    }

    Ok(config)
}
