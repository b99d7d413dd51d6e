//! # Answer Pipeline
//!
//! The top-level flow for one question:
//!
//! 1.  **Validation**: an empty question is rejected.
//! 2.  **Short-input guard**: very short questions get a request for more
//!     detail, before any store or provider call.
//! 3.  **Emergency gate**: rule-based emergencies are answered immediately with
//!     a fixed warning. They never wait on network calls.
//! 4.  **Normal path**: the question is logged (best effort) while FAQ
//!     candidates are retrieved, then generation is attempted.
//! 5.  **Source selection**: generated text wins, then the top FAQ answer, then
//!     the canned fallback.

use crate::{
    constants::{
        DEFAULT_CANDIDATE_LIMIT, DEFAULT_FAQ_FETCH_LIMIT, DEFAULT_MIN_QUESTION_CHARS, DISCLAIMER,
        EMERGENCY_BODY, EMERGENCY_HEADER, FALLBACK_ANSWER, RULES_PROVIDER, TOO_SHORT_ANSWER,
    },
    errors::PromptError,
    generation::{AnswerContext, GenerationClient, GenerationReport},
    providers::db::storage::FaqStore,
    retrieval::FaqRetriever,
    risk,
    types::{AnswerPath, AnswerResult, FaqEntry, Question, RiskAssessment, SourceKind},
};
use tracing::{debug, info};

/// Limits applied by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub min_question_chars: usize,
    pub fetch_limit: u32,
    pub candidate_limit: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_question_chars: DEFAULT_MIN_QUESTION_CHARS,
            fetch_limit: DEFAULT_FAQ_FETCH_LIMIT,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

/// Chooses the answer source. Exactly one branch applies.
pub fn select_source(
    report: &GenerationReport,
    candidates: &[FaqEntry],
) -> (SourceKind, String) {
    match (&report.text, candidates.first()) {
        (Some(text), _) if !text.trim().is_empty() => (SourceKind::Ai, text.clone()),
        (_, Some(top)) => (SourceKind::Faq, top.answer.clone()),
        _ => (SourceKind::Fallback, FALLBACK_ANSWER.to_string()),
    }
}

/// The rules-authored reply for an emergency.
pub fn emergency_answer(assessment: &RiskAssessment) -> String {
    let mut answer = format!("{EMERGENCY_HEADER}\n");
    if let Some(t) = assessment.temperature_c {
        answer.push_str(&format!("• Reported temperature: ~{t}°C.\n"));
    }
    answer.push_str(EMERGENCY_BODY);
    answer
}

fn rules_result(text: String, path: AnswerPath, urgent: bool) -> AnswerResult {
    AnswerResult {
        source: SourceKind::Fallback,
        text,
        used_generation: false,
        generation_error: None,
        candidates: Vec::new(),
        urgent,
        provider: RULES_PROVIDER.to_string(),
        path,
        disclaimer: DISCLAIMER.to_string(),
    }
}

/// Orchestrates risk gating, retrieval and generation for a question.
#[derive(Debug, Clone)]
pub struct AnswerPipeline {
    store: Box<dyn FaqStore>,
    retriever: FaqRetriever,
    generation: GenerationClient,
    settings: PipelineSettings,
}

impl AnswerPipeline {
    pub fn new(
        store: Box<dyn FaqStore>,
        generation: GenerationClient,
        settings: PipelineSettings,
    ) -> Self {
        let retriever = FaqRetriever::new(store.clone())
            .fetch_limit(settings.fetch_limit)
            .candidate_limit(settings.candidate_limit);
        Self {
            store,
            retriever,
            generation,
            settings,
        }
    }

    pub fn store(&self) -> &dyn FaqStore {
        self.store.as_ref()
    }

    pub fn generation(&self) -> &GenerationClient {
        &self.generation
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Answers a question. Only an empty question is an error; every other
    /// failure degrades to a lower-priority answer source.
    pub async fn answer(&self, question: Question) -> Result<AnswerResult, PromptError> {
        let text = question.text.trim();
        if text.is_empty() {
            return Err(PromptError::MissingQuestion);
        }
        let age_months = question.age_months;

        if text.chars().count() < self.settings.min_question_chars {
            info!(age_months, "Question too short. Asking for details.");
            return Ok(rules_result(
                TOO_SHORT_ANSWER.to_string(),
                AnswerPath::TooShort,
                false,
            ));
        }

        let assessment = risk::assess(age_months, text);
        if assessment.is_emergency() {
            info!(age_months, reason = ?assessment.reason, "Emergency detected. Answering from rules.");
            return Ok(rules_result(
                emergency_answer(&assessment),
                AnswerPath::Emergency,
                true,
            ));
        }

        let urgent = risk::is_urgent(age_months, text);
        let logged = Question::new(age_months, text);
        let (log_result, candidates) = tokio::join!(
            self.store.insert_question(&logged),
            self.retriever.retrieve(age_months, text)
        );
        if let Err(e) = log_result {
            debug!("Question log insert failed (ignored): {e}");
        }

        let report = self
            .generation
            .answer(&AnswerContext {
                age_months,
                question: text,
                faqs: &candidates,
                urgent,
            })
            .await;

        let (source, answer_text) = select_source(&report, &candidates);
        info!(%source, candidates = candidates.len(), urgent, "Answer assembled.");

        Ok(AnswerResult {
            source,
            text: answer_text,
            used_generation: report.used_generation,
            generation_error: report.error,
            candidates,
            urgent,
            provider: self.generation.provider_name().to_string(),
            path: AnswerPath::Answered,
            disclaimer: DISCLAIMER.to_string(),
        })
    }
}
