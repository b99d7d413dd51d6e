pub mod gemini;
pub mod local;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Sampling options sent with every generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
    /// Ask the provider for a JSON object instead of free text.
    #[serde(default)]
    pub json_output: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 140,
            candidate_count: 1,
            json_output: false,
        }
    }
}

/// A trait for interacting with a generative text provider.
///
/// One call is one blocking round trip against a single model. Model fallback
/// and retries are the caller's concern.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// A short label for the provider (e.g., "gemini", "local").
    fn name(&self) -> &str;

    /// Generates text for `prompt` with the given `model`.
    ///
    /// An empty string means the provider answered without usable text (for
    /// example, a safety block or a truncated completion).
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PromptError>;

    /// Lists the model identifiers the provider reports as available.
    async fn list_models(&self) -> Result<Vec<String>, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);
