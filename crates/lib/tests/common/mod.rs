#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared setup for the library's integration tests. Mock providers and
//! stores live in the `kidcare-test-utils` crate.

use dotenvy::dotenv;
use kidcare::{
    generation::{GenerationClient, GenerationSettings, OutputFormat},
    pipeline::{AnswerPipeline, PipelineSettings},
};
use kidcare_test_utils::{MockAiProvider, MockFaqStore};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub const MODEL_A: &str = "model-a";
pub const MODEL_B: &str = "model-b";

/// Settings with two short model names and plain-text output, so test replies
/// can be asserted verbatim.
pub fn text_settings() -> GenerationSettings {
    GenerationSettings {
        models: vec![MODEL_A.to_string(), MODEL_B.to_string()],
        output_format: OutputFormat::Text,
        ..Default::default()
    }
}

pub fn text_client(ai: &MockAiProvider) -> GenerationClient {
    GenerationClient::new(Box::new(ai.clone()), text_settings())
}

pub fn pipeline(store: &MockFaqStore, ai: &MockAiProvider) -> AnswerPipeline {
    AnswerPipeline::new(
        Box::new(store.clone()),
        text_client(ai),
        PipelineSettings::default(),
    )
}
