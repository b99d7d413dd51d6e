use crate::{
    errors::PromptError,
    providers::ai::{AiProvider, GenerationOptions},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct LocalAiRequest<'a> {
    messages: Vec<LocalAiMessage>,
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    n: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LocalAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LocalAiResponse {
    #[serde(default)]
    choices: Vec<LocalAiChoice>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChoice {
    message: LocalAiMessage,
}

#[derive(Deserialize, Debug)]
struct LocalAiErrorBody {
    error: LocalAiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct LocalAiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LocalModelList {
    #[serde(default)]
    data: Vec<LocalModelInfo>,
}

#[derive(Deserialize, Debug)]
struct LocalModelInfo {
    id: String,
}

// --- Local Provider implementation ---

/// A provider for interacting with a local or OpenAI-compatible chat
/// completions API.
#[derive(Clone, Debug)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
}

impl LocalAiProvider {
    /// Creates a new `LocalAiProvider`. `api_url` is the full
    /// `/chat/completions` endpoint.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl AiProvider for LocalAiProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PromptError> {
        let request_body = LocalAiRequest {
            messages: vec![LocalAiMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            model,
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
            n: options.candidate_count,
            stream: false,
            response_format: options
                .json_output
                .then_some(ResponseFormat { r#type: "json_object" }),
        };

        let response = self
            .authorized(self.client.post(&self.api_url))
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<LocalAiErrorBody>(&error_text)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(error_text);
            return Err(PromptError::AiApi { status, message });
        }

        let local_ai_response: LocalAiResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        let raw_response = local_ai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(raw_response.trim().to_string())
    }

    /// Lists models from the sibling `/models` endpoint of the configured URL.
    async fn list_models(&self) -> Result<Vec<String>, PromptError> {
        let models_url = match self.api_url.rsplit_once("/chat/completions") {
            Some((root, _)) => format!("{root}/models"),
            None => return Ok(Vec::new()),
        };

        let response = self
            .authorized(self.client.get(models_url))
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi { status, message });
        }

        let list: LocalModelList = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}
