//! # Default Answer Prompts
//!
//! This module contains the default prompt templates for answer generation and
//! the helpers that fill them. The templates can be overridden through the
//! server's `config.yml` or `prompt.yml`.
//!
//! Placeholders: `{age}`, `{question}`, `{context}`, `{urgent}`.

use crate::types::FaqEntry;

pub const ANSWER_SYSTEM_PROMPT: &str = r#"You are a pediatric assistant. Do NOT diagnose or prescribe medications/doses. Always answer in ENGLISH only. Tone: calm, concise, parent-friendly. Structure exactly:
• One short summary sentence.
• Three bullet actionable tips.
• One bullet: "When to see a doctor?".
If urgent red flags exist (<3 months + ≥38°C, breathing difficulty, cyanosis, altered consciousness), start with an URGENT warning first. Keep total ≤ 90 words."#;

pub const ANSWER_USER_PROMPT: &str = r#"Baby age (months): {age}
Question: {question}

{context}{urgent}"#;

pub const MINIMAL_ANSWER_USER_PROMPT: &str =
    r#"Baby age: {age} months. Question: {question}. {urgent}Answer ONLY in English. Max 5 short lines."#;

/// Appended to the system prompt when the provider is asked for JSON.
pub const STRUCTURED_OUTPUT_INSTRUCTIONS: &str = r#"Respond ONLY with a valid JSON object using these keys: "urgent_warning" (string, include only when urgent), "summary" (one sentence), "actions" (array of exactly 3 short strings), "see_doctor" (one sentence). Do not include any other text."#;

pub const URGENT_DIRECTIVE: &str = "\n\nIMPORTANT: Possible urgent sign. Start with URGENT warning.";
pub const MINIMAL_URGENT_DIRECTIVE: &str = "Urgent flags possible; start with URGENT. ";
pub const NO_CONTEXT_PLACEHOLDER: &str = "No related FAQ found. Provide general yet safe guidance.";

pub const QUESTION_CHAR_LIMIT: usize = 200;
pub const FAQ_QUESTION_CHAR_LIMIT: usize = 100;
pub const FAQ_ANSWER_CHAR_LIMIT: usize = 180;
/// At most this many FAQ excerpts go into the prompt.
pub const MAX_CONTEXT_FAQS: usize = 3;

/// The set of templates used by the generation client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub system: String,
    pub rich_user: String,
    pub minimal_user: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: ANSWER_SYSTEM_PROMPT.to_string(),
            rich_user: ANSWER_USER_PROMPT.to_string(),
            minimal_user: MINIMAL_ANSWER_USER_PROMPT.to_string(),
        }
    }
}

/// Collapses every whitespace run to a single space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses whitespace, trims and shortens `text` to `max` characters,
/// appending an ellipsis when something was cut.
pub fn cut(text: &str, max: usize) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.chars().count() > max {
        let head: String = collapsed.chars().take(max).collect();
        format!("{head}…")
    } else {
        collapsed
    }
}

/// Renders FAQ excerpts for the rich prompt, or the "no context" placeholder.
pub fn faq_context(faqs: &[FaqEntry]) -> String {
    if faqs.is_empty() {
        return NO_CONTEXT_PLACEHOLDER.to_string();
    }
    let excerpts = faqs
        .iter()
        .take(MAX_CONTEXT_FAQS)
        .enumerate()
        .map(|(i, f)| {
            format!(
                "- [{}] {} • {}-{} months\nQ: {}\nA: {}",
                i + 1,
                f.category.as_deref().unwrap_or_default(),
                f.age_min,
                f.age_max,
                cut(&f.question, FAQ_QUESTION_CHAR_LIMIT),
                cut(&f.answer, FAQ_ANSWER_CHAR_LIMIT)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Brief FAQ context:\n{excerpts}")
}

impl PromptTemplates {
    /// The full-context user prompt: age, question, FAQ excerpts and the
    /// optional urgency directive.
    ///
    /// When the filled prompt is longer than `max_chars`, only the FAQ context
    /// is shortened. The question and the urgency directive are kept whole.
    pub fn rich_user_prompt(
        &self,
        age_months: u32,
        question: &str,
        faqs: &[FaqEntry],
        urgent: bool,
        max_chars: usize,
    ) -> String {
        let fill = |context: &str| {
            self.rich_user
                .replace("{age}", &age_months.to_string())
                .replace("{question}", &cut(question, QUESTION_CHAR_LIMIT))
                .replace("{context}", context)
                .replace("{urgent}", if urgent { URGENT_DIRECTIVE } else { "" })
        };

        let context = faq_context(faqs);
        let full = fill(&context);
        let overflow = full.chars().count().saturating_sub(max_chars);
        if overflow == 0 {
            return full;
        }
        // One extra char for the ellipsis `cut` appends.
        let keep = context.chars().count().saturating_sub(overflow + 1);
        fill(&cut(&context, keep))
    }

    /// The degraded user prompt: only age and question.
    pub fn minimal_user_prompt(&self, age_months: u32, question: &str, urgent: bool) -> String {
        self.minimal_user
            .replace("{age}", &age_months.to_string())
            .replace("{question}", &cut(question, QUESTION_CHAR_LIMIT))
            .replace("{urgent}", if urgent { MINIMAL_URGENT_DIRECTIVE } else { "" })
    }
}
