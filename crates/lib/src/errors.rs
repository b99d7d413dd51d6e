use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Custom error types for the answer pipeline and its providers.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Missing parameter: question")]
    MissingQuestion,
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("{message}")]
    AiApi { status: u16, message: String },
    #[error("{0}")]
    NoModelAvailable(String),
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("Invalid FAQ entry: {0}")]
    InvalidFaq(String),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn model_unavailable_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)not\s+found|unsupported|permission").expect("static pattern is valid")
    })
}

impl PromptError {
    /// Whether the provider rejected the model itself (unknown, unsupported or
    /// not permitted), meaning the next model in the chain may still work.
    pub fn is_model_unavailable(&self) -> bool {
        match self {
            PromptError::AiApi { message, .. } => model_unavailable_pattern().is_match(message),
            _ => false,
        }
    }
}
