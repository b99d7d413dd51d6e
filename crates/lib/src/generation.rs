//! # Generation Client
//!
//! Wraps the generative text provider with the behavior the answer pipeline
//! relies on:
//!
//! 1.  **Model fallback**: the configured models are tried in order. A model the
//!     provider reports as not found, unsupported or not permitted, or one that
//!     returns no usable text, hands over to the next model. Any other provider
//!     error aborts the chain.
//! 2.  **Two-tier content fallback**: the full-context prompt is tried first;
//!     if it fails, a minimal prompt (age and question only) is tried once.
//! 3.  **Output shaping**: structured replies are rendered into a fixed bullet
//!     layout, and all text is whitespace-sanitized.
//!
//! [`GenerationClient::answer`] never returns an error. Failures are reported in
//! the [`GenerationReport`].

use crate::{
    constants::DEFAULT_MODELS,
    errors::PromptError,
    prompts::{collapse_whitespace, cut, PromptTemplates, STRUCTURED_OUTPUT_INSTRUCTIONS},
    providers::ai::{AiProvider, GenerationOptions},
    types::FaqEntry,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Message of the error returned when every model failed softly.
pub const NO_MODEL_AVAILABLE: &str = "no_model_available_or_empty";

/// How the provider is asked to shape its reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Free text following the bullet layout described in the system prompt.
    Text,
    /// A JSON object with discrete fields, rendered locally into the layout.
    #[default]
    Structured,
}

/// Which prompt variant an attempt uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTier {
    Rich,
    Minimal,
}

/// Tunables for the generation client.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Model identifiers, tried in order.
    pub models: Vec<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Output budget for the minimal tier.
    pub minimal_max_output_tokens: u32,
    pub candidate_count: u32,
    pub output_format: OutputFormat,
    /// Character cap on the rich user prompt. FAQ context is shortened first.
    pub rich_prompt_chars: usize,
    /// Character cap on the minimal user prompt.
    pub minimal_prompt_chars: usize,
    pub templates: PromptTemplates,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            temperature: 0.2,
            max_output_tokens: 140,
            minimal_max_output_tokens: 96,
            candidate_count: 1,
            output_format: OutputFormat::default(),
            rich_prompt_chars: 1600,
            minimal_prompt_chars: 800,
            templates: PromptTemplates::default(),
        }
    }
}

/// The inputs the client turns into prompts.
#[derive(Debug, Clone, Copy)]
pub struct AnswerContext<'a> {
    pub age_months: u32,
    pub question: &'a str,
    pub faqs: &'a [FaqEntry],
    pub urgent: bool,
}

/// Text produced by one successful attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    pub text: String,
    pub model: String,
}

/// The outcome of [`GenerationClient::answer`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationReport {
    pub text: Option<String>,
    pub used_generation: bool,
    pub error: Option<String>,
    pub model: Option<String>,
}

/// The discrete fields of a structured reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructuredAnswer {
    #[serde(default)]
    pub urgent_warning: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub see_doctor: Option<String>,
}

const MAX_ACTIONS: usize = 3;

fn code_fence_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("static pattern is valid")
    })
}

/// Collapses whitespace runs within each line, trims, and drops blank lines.
pub fn sanitize(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses a structured reply, tolerating a surrounding markdown code fence.
pub fn parse_structured(raw: &str) -> Option<StructuredAnswer> {
    let body = code_fence_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

fn looks_like_json(raw: &str) -> bool {
    let trimmed = raw.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with("```")
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Renders structured fields into the fixed answer layout. Missing fields are
/// left out.
pub fn render_structured(answer: &StructuredAnswer) -> String {
    let mut lines = Vec::new();
    if let Some(warning) = non_empty(&answer.urgent_warning) {
        lines.push(warning.to_string());
    }
    if let Some(summary) = non_empty(&answer.summary) {
        lines.push(summary.to_string());
    }
    lines.extend(
        answer
            .actions
            .iter()
            .map(|a| a.trim().trim_start_matches(['•', '-', '*']).trim())
            .filter(|a| !a.is_empty())
            .take(MAX_ACTIONS)
            .map(|a| format!("• {a}")),
    );
    if let Some(doctor) = non_empty(&answer.see_doctor) {
        lines.push(format!("• When to see a doctor: {doctor}"));
    }
    sanitize(&lines.join("\n"))
}

/// Generates parent-facing answers through an [`AiProvider`].
#[derive(Debug, Clone)]
pub struct GenerationClient {
    provider: Box<dyn AiProvider>,
    settings: GenerationSettings,
}

impl GenerationClient {
    pub fn new(provider: Box<dyn AiProvider>, settings: GenerationSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &dyn AiProvider {
        self.provider.as_ref()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn models(&self) -> &[String] {
        &self.settings.models
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// The system prompt, extended with JSON instructions in structured mode.
    pub fn system_prompt(&self) -> String {
        match self.settings.output_format {
            OutputFormat::Text => self.settings.templates.system.clone(),
            OutputFormat::Structured => format!(
                "{}\n{STRUCTURED_OUTPUT_INSTRUCTIONS}",
                self.settings.templates.system
            ),
        }
    }

    fn options(&self, tier: PromptTier) -> GenerationOptions {
        GenerationOptions {
            temperature: self.settings.temperature,
            max_output_tokens: match tier {
                PromptTier::Rich => self.settings.max_output_tokens,
                PromptTier::Minimal => self.settings.minimal_max_output_tokens,
            },
            candidate_count: self.settings.candidate_count,
            json_output: self.settings.output_format == OutputFormat::Structured,
        }
    }

    /// Turns a raw provider reply into display text. Empty means unusable.
    ///
    /// In structured mode a reply that looks like JSON but does not parse is
    /// a cut-off object and counts as unusable.
    pub fn render(&self, raw: &str) -> String {
        match self.settings.output_format {
            OutputFormat::Structured => match parse_structured(raw) {
                Some(answer) => render_structured(&answer),
                None if looks_like_json(raw) => {
                    debug!("Discarding malformed structured reply.");
                    String::new()
                }
                None => sanitize(raw),
            },
            OutputFormat::Text => sanitize(raw),
        }
    }

    /// Runs one prompt through the model fallback chain.
    pub async fn generate(
        &self,
        system: &str,
        user: &str,
        tier: PromptTier,
    ) -> Result<GeneratedText, PromptError> {
        let char_limit = match tier {
            PromptTier::Rich => self.settings.rich_prompt_chars,
            PromptTier::Minimal => self.settings.minimal_prompt_chars,
        };
        let prompt = format!(
            "System: {}\n\nUser: {}",
            collapse_whitespace(system),
            cut(user, char_limit)
        );
        let options = self.options(tier);

        for model in &self.settings.models {
            debug!(model = %model, ?tier, "Attempting generation");
            match self.provider.generate(model, &prompt, &options).await {
                Ok(raw) => {
                    let text = self.render(&raw);
                    if !text.is_empty() {
                        info!(model = %model, ?tier, "Generation succeeded.");
                        return Ok(GeneratedText {
                            text,
                            model: model.clone(),
                        });
                    }
                    info!(model = %model, "Model returned no usable text. Trying next model.");
                }
                Err(e) if e.is_model_unavailable() => {
                    warn!(model = %model, "Model unavailable ({e}). Trying next model.");
                }
                Err(e) => {
                    warn!(model = %model, "Generation aborted: {e}");
                    return Err(e);
                }
            }
        }

        Err(PromptError::NoModelAvailable(NO_MODEL_AVAILABLE.to_string()))
    }

    /// Produces an answer with the rich prompt, retrying once with the minimal
    /// prompt. Never fails; the last error is carried in the report.
    pub async fn answer(&self, ctx: &AnswerContext<'_>) -> GenerationReport {
        let templates = &self.settings.templates;
        let system = self.system_prompt();

        let rich_user = templates.rich_user_prompt(
            ctx.age_months,
            ctx.question,
            ctx.faqs,
            ctx.urgent,
            self.settings.rich_prompt_chars,
        );
        let outcome = match self.generate(&system, &rich_user, PromptTier::Rich).await {
            Ok(generated) => Ok(generated),
            Err(e) => {
                warn!("Rich prompt failed ({e}). Retrying with minimal prompt.");
                let minimal_user =
                    templates.minimal_user_prompt(ctx.age_months, ctx.question, ctx.urgent);
                self.generate(&system, &minimal_user, PromptTier::Minimal)
                    .await
            }
        };

        match outcome {
            Ok(generated) => GenerationReport {
                text: Some(generated.text),
                used_generation: true,
                error: None,
                model: Some(generated.model),
            },
            Err(e) => {
                warn!("Generation failed on both tiers: {e}");
                GenerationReport {
                    text: None,
                    used_generation: false,
                    error: Some(e.to_string()),
                    model: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_line_structure() {
        let raw = "  Summary   line.  \n\n•  Tip   one\n\t• Tip two  \n";
        assert_eq!(sanitize(raw), "Summary line.\n• Tip one\n• Tip two");
    }

    #[test]
    fn renders_structured_fields_in_fixed_order() {
        let answer = StructuredAnswer {
            urgent_warning: Some("URGENT: seek care now.".to_string()),
            summary: Some("Mild night cough is common.".to_string()),
            actions: vec![
                "Use a humidifier".to_string(),
                "- Offer fluids".to_string(),
                "Raise the head of the bed slightly".to_string(),
                "A fourth tip".to_string(),
            ],
            see_doctor: Some("If breathing becomes fast or laboured.".to_string()),
        };
        assert_eq!(
            render_structured(&answer),
            "URGENT: seek care now.\n\
             Mild night cough is common.\n\
             • Use a humidifier\n\
             • Offer fluids\n\
             • Raise the head of the bed slightly\n\
             • When to see a doctor: If breathing becomes fast or laboured."
        );
    }

    #[test]
    fn missing_fields_are_omitted() {
        let answer = StructuredAnswer {
            summary: Some("Only a summary.".to_string()),
            see_doctor: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(render_structured(&answer), "Only a summary.");
        assert_eq!(render_structured(&StructuredAnswer::default()), "");
    }

    #[test]
    fn parses_fenced_and_bare_json() {
        let fenced = "```json\n{\"summary\": \"Hi\", \"actions\": [\"a\"]}\n```";
        let parsed = parse_structured(fenced).expect("fenced JSON should parse");
        assert_eq!(parsed.summary.as_deref(), Some("Hi"));
        assert_eq!(parsed.actions, vec!["a"]);

        let bare = "Here you go: {\"see_doctor\": \"Soon\"}";
        let parsed = parse_structured(bare).expect("embedded JSON should parse");
        assert_eq!(parsed.see_doctor.as_deref(), Some("Soon"));

        assert!(parse_structured("plain text answer").is_none());
    }

    #[test]
    fn cut_off_json_is_not_mistaken_for_text() {
        assert!(looks_like_json("  {\"summary\": \"Mild"));
        assert!(looks_like_json("```json\n{\"summary\""));
        assert!(!looks_like_json("Offer fluids {often}"));
    }
}
