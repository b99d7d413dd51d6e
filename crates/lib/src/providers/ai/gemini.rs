use crate::{
    errors::PromptError,
    providers::ai::{AiProvider, GenerationOptions},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};
use tracing::debug;

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    candidate_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize, Debug, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize, Debug)]
struct ModelInfo {
    name: String,
}

// --- Gemini Provider implementation ---

/// A provider for interacting with the Google Gemini API.
///
/// `base_url` is the versioned API root, e.g.
/// `https://generativelanguage.googleapis.com/v1beta`. The model is appended per
/// request so a single provider can walk a model fallback chain.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: ReqwestClient,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` whose requests time out after `timeout`.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

/// Converts a non-success response into `PromptError::AiApi`, preferring the
/// message from Gemini's error object.
async fn api_error(response: reqwest::Response) -> PromptError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GeminiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| format!("HTTP {status}"));
    PromptError::AiApi { status, message }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    /// Generates text using the Gemini `generateContent` endpoint.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PromptError> {
        let request_body = GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
                candidate_count: options.candidate_count,
                response_mime_type: options.json_output.then_some("application/json"),
            },
        };

        debug!(model = %model, "--> Sending prompt to Gemini");

        let response = self
            .client
            .post(self.generate_url(model))
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        let candidate = gemini_response.candidates.first();
        let finish_reason = candidate.and_then(|c| c.finish_reason.as_deref());
        // A JSON object cut at the token limit cannot be rendered.
        if options.json_output && finish_reason == Some("MAX_TOKENS") {
            debug!(model = %model, "<-- Gemini stopped at MAX_TOKENS, discarding partial JSON");
            return Ok(String::new());
        }

        let text = candidate
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        debug!(model = %model, chars = text.len(), "<-- Gemini response received");
        Ok(text.trim().to_string())
    }

    async fn list_models(&self) -> Result<Vec<String>, PromptError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        Ok(list
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}
