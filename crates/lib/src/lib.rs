//! # Parental Advice Answers
//!
//! This crate turns a child's age and a parent's free-text health question into
//! a safe, parent-friendly answer. The [`AnswerPipeline`] combines rule-based
//! risk gating, keyword-scored FAQ retrieval from a [`FaqStore`], and LLM
//! generation with model and prompt fallbacks through an [`AiProvider`].

pub mod constants;
pub mod errors;
pub mod generation;
pub mod keywords;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod retrieval;
pub mod risk;
pub mod types;

pub use errors::PromptError;
pub use generation::{GenerationClient, GenerationSettings, OutputFormat};
pub use pipeline::{AnswerPipeline, PipelineSettings};
pub use providers::{ai::AiProvider, db::storage::FaqStore};
pub use types::{AnswerResult, FaqEntry, Question, SourceKind};
