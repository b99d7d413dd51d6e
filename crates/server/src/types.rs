//! # API Payloads
//!
//! Request parsing and response bodies for the HTTP API. Request bodies are
//! parsed leniently: a body that is not JSON counts as `{}` and loosely typed
//! fields are coerced instead of rejected.

use kidcare::types::{AnswerResult, FaqEntry, Feedback, Question, SourceKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

fn age_label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)age|yaş|yas").expect("static pattern is valid"))
}

fn question_label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)question|soru").expect("static pattern is valid"))
}

/// Parses a request body as JSON, treating anything unparseable as `{}`.
pub fn lenient_json(body: &[u8]) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Default::default()))
}

/// Coerces a loosely typed age into whole months.
///
/// Numbers and numeric strings are floored. Negative, non-finite and
/// non-numeric values become 0.
pub fn coerce_age(value: Option<&Value>) -> u32 {
    let months = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match months {
        Some(m) if m.is_finite() && m > 0.0 => m.floor().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// One field of a form-builder webhook.
#[derive(Debug, Deserialize)]
struct WebhookField {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    value: Value,
}

impl WebhookField {
    fn matches(&self, pattern: &Regex) -> bool {
        [&self.key, &self.label]
            .into_iter()
            .flatten()
            .any(|name| pattern.is_match(name))
    }
}

fn webhook_fields(body: &Value) -> Vec<WebhookField> {
    body.pointer("/data/fields")
        .cloned()
        .and_then(|fields| serde_json::from_value(fields).ok())
        .unwrap_or_default()
}

/// Extracts the question from an `/api/ask` body.
///
/// The flat shape `{ ageMonths, question }` is read first. When the age is 0
/// or the question is empty, the missing values are looked up in a webhook
/// shape `{ data: { fields: [{ key, label, value }] } }`.
pub fn parse_ask(body: &Value) -> Question {
    let mut age_months = coerce_age(body.get("ageMonths"));
    let mut text = coerce_text(body.get("question"));

    if age_months == 0 || text.is_empty() {
        let fields = webhook_fields(body);
        if age_months == 0 {
            if let Some(field) = fields.iter().find(|f| f.matches(age_label_pattern())) {
                age_months = coerce_age(Some(&field.value));
            }
        }
        if text.is_empty() {
            if let Some(field) = fields.iter().find(|f| f.matches(question_label_pattern())) {
                text = coerce_text(Some(&field.value));
            }
        }
    }

    Question::new(age_months, text)
}

/// Summary metadata returned with every answer.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskMeta {
    pub source: SourceKind,
    pub llm_used: bool,
    pub llm_error: Option<String>,
    pub provider: String,
    pub matched_faqs: usize,
    pub urgent: bool,
}

/// The response body for `POST /api/ask`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub candidates: Vec<FaqEntry>,
    pub disclaimer: String,
    pub meta: AskMeta,
}

impl From<AnswerResult> for AskResponse {
    fn from(result: AnswerResult) -> Self {
        Self {
            meta: AskMeta {
                source: result.source,
                llm_used: result.used_generation,
                llm_error: result.generation_error,
                provider: result.provider,
                matched_faqs: result.candidates.len(),
                urgent: result.urgent,
            },
            answer: result.text,
            candidates: result.candidates,
            disclaimer: result.disclaimer,
        }
    }
}

/// Reads a feedback body. Returns `None` when `was_helpful` is not a boolean.
pub fn parse_feedback(body: &Value) -> Option<Feedback> {
    let was_helpful = body.get("was_helpful")?.as_bool()?;
    Some(Feedback {
        question_text: coerce_text(body.get("question_text")),
        age_months: coerce_age(body.get("age_months")),
        was_helpful,
    })
}

/// The response body for `GET /api/models`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub provider: String,
    /// The configured fallback chain, in order.
    pub configured: Vec<String>,
    /// Models the provider reports as available.
    pub available: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unparseable_body_is_empty_object() {
        assert_eq!(lenient_json(b"not json"), json!({}));
        assert_eq!(lenient_json(b"[1, 2]"), json!({}));
        assert_eq!(lenient_json(br#"{"a": 1}"#), json!({"a": 1}));
    }

    #[test]
    fn age_is_coerced_to_whole_months() {
        assert_eq!(coerce_age(Some(&json!(7.9))), 7);
        assert_eq!(coerce_age(Some(&json!("10"))), 10);
        assert_eq!(coerce_age(Some(&json!(" 4.5 "))), 4);
        assert_eq!(coerce_age(Some(&json!(-3))), 0);
        assert_eq!(coerce_age(Some(&json!("NaN"))), 0);
        assert_eq!(coerce_age(Some(&json!("ten"))), 0);
        assert_eq!(coerce_age(Some(&json!(true))), 0);
        assert_eq!(coerce_age(None), 0);
    }

    #[test]
    fn flat_shape_wins_over_webhook() {
        let body = json!({
            "ageMonths": 6,
            "question": "Is it normal to drool a lot?",
            "data": {"fields": [{"label": "Age", "value": 20}]}
        });
        assert_eq!(parse_ask(&body), Question::new(6, "Is it normal to drool a lot?"));
    }

    #[test]
    fn webhook_fields_fill_missing_values() {
        let body = json!({
            "data": {"fields": [
                {"key": "question_abc", "label": "Sorunuz", "value": "  Gece çok uyanıyor, normal mi?  "},
                {"key": "q2", "label": "Bebeğin yaşı (ay)", "value": "9"}
            ]}
        });
        assert_eq!(parse_ask(&body), Question::new(9, "Gece çok uyanıyor, normal mi?"));
    }

    #[test]
    fn webhook_only_fills_what_is_missing() {
        let body = json!({
            "ageMonths": 0,
            "question": "Why does my baby spit up?",
            "data": {"fields": [
                {"label": "Age", "value": 3},
                {"label": "Question", "value": "ignored"}
            ]}
        });
        assert_eq!(parse_ask(&body), Question::new(3, "Why does my baby spit up?"));
    }

    #[test]
    fn feedback_requires_boolean() {
        assert_eq!(parse_feedback(&json!({"was_helpful": "yes"})), None);
        assert_eq!(parse_feedback(&json!({})), None);
        let feedback = parse_feedback(&json!({
            "question_text": "Teething?",
            "age_months": "8",
            "was_helpful": false
        }))
        .unwrap();
        assert_eq!(feedback.age_months, 8);
        assert!(!feedback.was_helpful);
    }
}
