use crate::{
    errors::PromptError,
    types::{FaqEntry, Feedback, NewFaq, Question},
};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for the persistent store behind the answer pipeline.
///
/// This trait defines the few operations the pipeline and the server need:
/// logging questions, reading FAQ rows, and recording feedback.
#[async_trait]
pub trait FaqStore: Send + Sync + DynClone + Debug {
    /// Returns the name of the storage provider (e.g., "SQLite").
    fn name(&self) -> &str;

    /// Appends the question to the question log.
    async fn insert_question(&self, question: &Question) -> Result<(), PromptError>;

    /// Returns up to `limit` FAQ rows whose age range contains `age_months`.
    async fn faqs_for_age(&self, age_months: u32, limit: u32) -> Result<Vec<FaqEntry>, PromptError>;

    /// Returns up to `limit` FAQ rows whose question or answer contains any of
    /// `keywords`, regardless of age.
    async fn search_faqs(&self, keywords: &[String], limit: u32)
        -> Result<Vec<FaqEntry>, PromptError>;

    /// Stores a new FAQ entry and returns it with its assigned id.
    async fn insert_faq(&self, faq: NewFaq) -> Result<FaqEntry, PromptError>;

    /// Counts stored FAQ entries.
    async fn count_faqs(&self) -> Result<u64, PromptError>;

    /// Records a helpful/not-helpful vote.
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), PromptError>;
}

dyn_clone::clone_trait_object!(FaqStore);
