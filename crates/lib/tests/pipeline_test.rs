//! # Answer Pipeline Tests
//!
//! End-to-end checks of the orchestration paths with a mock store and a mock
//! provider: too-short input, the emergency gate, and the three answer
//! sources.

mod common;

use common::{pipeline, setup_tracing, MODEL_A, MODEL_B};
use kidcare::{
    constants::{DISCLAIMER, FALLBACK_ANSWER, RULES_PROVIDER, TOO_SHORT_ANSWER},
    errors::PromptError,
    generation::NO_MODEL_AVAILABLE,
    types::{AnswerPath, Question, SourceKind},
};
use kidcare_test_utils::{faq, MockAiProvider, MockFaqStore, MockReply};

const COUGH_QUESTION: &str = "Baby has mild cough at night, otherwise fine and eating well";

fn cough_faqs() -> Vec<kidcare::FaqEntry> {
    vec![
        faq("1", 6, 12, "cough", "Night cough", "A humidifier can help at night."),
        faq("2", 6, 12, "sleep", "Sleep schedule", "Keep a calm bedtime routine."),
    ]
}

#[tokio::test]
async fn test_emergency_short_circuits_without_side_effects() {
    setup_tracing();
    let store = MockFaqStore::new(cough_faqs());
    let ai = MockAiProvider::new();
    let pipeline = pipeline(&store, &ai);

    let result = pipeline
        .answer(Question::new(2, "Bebeğimde nefes darlığı var"))
        .await
        .unwrap();

    assert!(result.urgent);
    assert_eq!(result.path, AnswerPath::Emergency);
    assert_eq!(result.source, SourceKind::Fallback);
    assert_eq!(result.provider, RULES_PROVIDER);
    assert!(result.text.starts_with("🔺 URGENT WARNING"));
    assert!(result.candidates.is_empty());
    assert_eq!(store.calls().total(), 0, "no store call on the emergency path");
    assert_eq!(ai.call_count(), 0, "no provider call on the emergency path");
}

#[tokio::test]
async fn test_high_fever_emergency_reports_temperature() {
    setup_tracing();
    let store = MockFaqStore::default();
    let ai = MockAiProvider::new();
    let pipeline = pipeline(&store, &ai);

    let result = pipeline
        .answer(Question::new(18, "Ateşi 40.2 derece, ne yapmalıyım?"))
        .await
        .unwrap();

    assert_eq!(result.path, AnswerPath::Emergency);
    assert!(result.text.contains("~40.2°C"));
    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn test_too_short_question_asks_for_details() {
    setup_tracing();
    let store = MockFaqStore::new(cough_faqs());
    let ai = MockAiProvider::new();
    let pipeline = pipeline(&store, &ai);

    let result = pipeline.answer(Question::new(8, "short")).await.unwrap();

    assert_eq!(result.path, AnswerPath::TooShort);
    assert_eq!(result.source, SourceKind::Fallback);
    assert_eq!(result.text, TOO_SHORT_ANSWER);
    assert!(result.candidates.is_empty());
    assert!(!result.urgent);
    assert_eq!(store.calls().total(), 0);
    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    setup_tracing();
    let pipeline = pipeline(&MockFaqStore::default(), &MockAiProvider::new());

    let result = pipeline.answer(Question::new(8, "   ")).await;

    assert!(matches!(result, Err(PromptError::MissingQuestion)));
}

#[tokio::test]
async fn test_generated_answer_wins() {
    setup_tracing();
    let store = MockFaqStore::new(cough_faqs());
    let ai = MockAiProvider::new();
    ai.add_reply(MODEL_A, MockReply::text("Mild night cough is common. Keep the air moist."));
    let pipeline = pipeline(&store, &ai);

    let result = pipeline
        .answer(Question::new(10, COUGH_QUESTION))
        .await
        .unwrap();

    assert_eq!(result.source, SourceKind::Ai);
    assert_eq!(result.text, "Mild night cough is common. Keep the air moist.");
    assert!(result.used_generation);
    assert_eq!(result.generation_error, None);
    assert_eq!(result.candidates.len(), 2);
    assert_eq!(result.candidates[0].id, "1", "the cough entry scores highest");
    assert_eq!(result.provider, "mock");
    assert_eq!(result.path, AnswerPath::Answered);
    assert_eq!(result.disclaimer, DISCLAIMER);
    assert!(!result.urgent);

    let logged = store.questions();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0], Question::new(10, COUGH_QUESTION));
}

#[tokio::test]
async fn test_faq_answer_when_generation_fails() {
    setup_tracing();
    let store = MockFaqStore::new(cough_faqs());
    let ai = MockAiProvider::new();
    let pipeline = pipeline(&store, &ai);

    let result = pipeline
        .answer(Question::new(10, COUGH_QUESTION))
        .await
        .unwrap();

    assert_eq!(result.source, SourceKind::Faq);
    assert_eq!(result.text, "A humidifier can help at night.");
    assert!(!result.used_generation);
    assert_eq!(result.generation_error.as_deref(), Some(NO_MODEL_AVAILABLE));
    let models: Vec<String> = ai.get_calls().into_iter().map(|c| c.model).collect();
    assert_eq!(models, vec![MODEL_A, MODEL_B, MODEL_A, MODEL_B]);
}

#[tokio::test]
async fn test_canned_fallback_without_generation_or_candidates() {
    setup_tracing();
    let store = MockFaqStore::default();
    let ai = MockAiProvider::new();
    ai.set_fallback(MockReply::server_error());
    let pipeline = pipeline(&store, &ai);

    let result = pipeline
        .answer(Question::new(10, COUGH_QUESTION))
        .await
        .unwrap();

    assert_eq!(result.source, SourceKind::Fallback);
    assert_eq!(result.text, FALLBACK_ANSWER);
    assert!(result.candidates.is_empty());
    assert_eq!(result.generation_error.as_deref(), Some("Internal error encountered."));
    assert_eq!(result.provider, "mock");
}

#[tokio::test]
async fn test_question_log_failure_is_ignored() {
    setup_tracing();
    let store = MockFaqStore::new(cough_faqs()).failing_writes();
    let ai = MockAiProvider::new();
    ai.set_fallback(MockReply::text("Keep the air moist."));
    let pipeline = pipeline(&store, &ai);

    let result = pipeline
        .answer(Question::new(10, COUGH_QUESTION))
        .await
        .unwrap();

    assert_eq!(result.source, SourceKind::Ai);
    assert_eq!(store.calls().insert_question, 1);
    assert!(store.questions().is_empty());
}

#[tokio::test]
async fn test_urgent_young_infant_steers_generation() {
    setup_tracing();
    let store = MockFaqStore::default();
    let ai = MockAiProvider::new();
    ai.set_fallback(MockReply::text("URGENT: see a doctor today."));
    let pipeline = pipeline(&store, &ai);

    // A fever word without a reading stays below the emergency gate.
    let result = pipeline
        .answer(Question::new(1, "She feels feverish and sleepy today"))
        .await
        .unwrap();

    assert_eq!(result.path, AnswerPath::Answered);
    assert!(result.urgent);
    assert!(ai.get_calls()[0].prompt.contains("Start with URGENT warning"));
}
