//! # Shared Types
//!
//! Request, FAQ and result types that flow through the answer pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parent's question about a child of a given age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub age_months: u32,
    pub text: String,
}

impl Question {
    pub fn new(age_months: u32, text: impl Into<String>) -> Self {
        Self {
            age_months,
            text: text.into(),
        }
    }
}

/// A stored question/answer pair with the age range it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: String,
    pub age_min: i64,
    pub age_max: i64,
    #[serde(default)]
    pub category: Option<String>,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl FaqEntry {
    /// Whether the entry applies to a child of `age_months`.
    pub fn covers_age(&self, age_months: u32) -> bool {
        let age = i64::from(age_months);
        self.age_min <= age && age <= self.age_max
    }
}

/// An FAQ entry as supplied by a seed file, before it receives an id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFaq {
    pub age_min: i64,
    pub age_max: i64,
    #[serde(default)]
    pub category: Option<String>,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// A helpful/not-helpful vote on an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub question_text: String,
    pub age_months: u32,
    pub was_helpful: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Emergency,
    Normal,
}

/// Which emergency rule fired. Listed in priority order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "term", rename_all = "snake_case")]
pub enum RiskReason {
    /// Temperature of 40°C or more at any age.
    Hyperpyrexia,
    /// Under 3 months old with 38°C or more.
    YoungInfantFever,
    /// A red-flag term appeared in the question.
    RedFlag(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub temperature_c: Option<f64>,
    pub reason: Option<RiskReason>,
}

impl RiskAssessment {
    pub fn is_emergency(&self) -> bool {
        self.level == RiskLevel::Emergency
    }
}

/// The subsystem that produced the final answer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "FAQ")]
    Faq,
    #[serde(rename = "FALLBACK")]
    Fallback,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceKind::Ai => "AI",
            SourceKind::Faq => "FAQ",
            SourceKind::Fallback => "FALLBACK",
        };
        f.write_str(label)
    }
}

/// The terminal state a request reached in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerPath {
    TooShort,
    Emergency,
    Answered,
}

/// The assembled outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    pub source: SourceKind,
    pub text: String,
    pub used_generation: bool,
    pub generation_error: Option<String>,
    pub candidates: Vec<FaqEntry>,
    pub urgent: bool,
    pub provider: String,
    pub path: AnswerPath,
    pub disclaimer: String,
}
