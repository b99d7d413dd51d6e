//! # Configuration Tests
//!
//! This file contains tests for the configuration loading logic: YAML
//! defaults, `${VAR}` substitution and environment overrides. Tests that touch
//! the environment run serially.

use anyhow::Result;
use kidcare::{
    generation::OutputFormat,
    prompts::{ANSWER_SYSTEM_PROMPT, MINIMAL_ANSWER_USER_PROMPT},
};
use kidcare_server::config::{get_config, ConfigError};
use serial_test::serial;
use std::{env, fs, path::PathBuf};
use tempfile::{tempdir, TempDir};

const MINIMAL_CONFIG: &str = r#"
provider:
  provider: "gemini"
  api_key: "${KIDCARE_TEST_GEMINI_KEY}"
"#;

/// A helper function to clear all environment variables read by these tests.
/// This ensures a clean slate before each test runs.
fn clear_env_vars() {
    env::remove_var("PORT");
    env::remove_var("DB_URL");
    env::remove_var("KIDCARE_TEST_GEMINI_KEY");
    env::remove_var("KIDCARE_PROVIDER__TIMEOUT_SECS");
    env::remove_var("KIDCARE_PIPELINE__MIN_QUESTION_CHARS");
    env::remove_var("KIDCARE_GENERATION__OUTPUT_FORMAT");
}

fn write_config(content: &str) -> Result<(TempDir, PathBuf)> {
    let dir = tempdir()?;
    let path = dir.path().join("config.yml");
    fs::write(&path, content)?;
    Ok((dir, path))
}

#[test]
#[serial]
fn test_minimal_config_uses_defaults() -> Result<()> {
    clear_env_vars();
    env::set_var("KIDCARE_TEST_GEMINI_KEY", "secret-key");
    let (_dir, path) = write_config(MINIMAL_CONFIG)?;

    let config = get_config(path.to_str())?;

    assert_eq!(config.port, 9090);
    assert_eq!(config.db_url, "db/kidcare.db");
    assert_eq!(config.faq_seed_file, None);
    assert_eq!(config.provider.api_key.as_deref(), Some("secret-key"));
    assert_eq!(config.provider.api_url, None);
    assert_eq!(
        config.provider.models,
        vec!["gemini-2.0-flash-lite", "gemini-2.0-flash", "gemini-2.5-flash"]
    );
    assert_eq!(config.provider.timeout_secs, 15);
    assert_eq!(config.generation.max_output_tokens, 140);
    assert_eq!(config.generation.minimal_max_output_tokens, 96);
    assert_eq!(config.generation.output_format, OutputFormat::Structured);
    assert_eq!(config.pipeline.min_question_chars, 12);
    assert_eq!(config.pipeline.fetch_limit, 20);
    assert_eq!(config.pipeline.candidate_limit, 3);
    assert_eq!(config.prompts.system, ANSWER_SYSTEM_PROMPT);
    assert_eq!(config.prompts.minimal_user, MINIMAL_ANSWER_USER_PROMPT);

    clear_env_vars();
    Ok(())
}

#[test]
#[serial]
fn test_debug_output_redacts_api_key() -> Result<()> {
    clear_env_vars();
    env::set_var("KIDCARE_TEST_GEMINI_KEY", "secret-key");
    let (_dir, path) = write_config(MINIMAL_CONFIG)?;

    let config = get_config(path.to_str())?;
    let printed = format!("{config:?}");

    assert!(!printed.contains("secret-key"));
    assert!(printed.contains("<redacted>"));
    assert!(printed.contains("gemini-2.0-flash-lite"));

    clear_env_vars();
    Ok(())
}

#[test]
#[serial]
fn test_unset_placeholder_becomes_empty() -> Result<()> {
    clear_env_vars();
    let (_dir, path) = write_config(MINIMAL_CONFIG)?;

    let config = get_config(path.to_str())?;

    assert_eq!(config.provider.api_key.as_deref(), Some(""));
    Ok(())
}

#[test]
#[serial]
fn test_environment_overrides_file_values() -> Result<()> {
    clear_env_vars();
    let (_dir, path) = write_config(
        r#"
port: 8000
provider:
  provider: "gemini"
  api_key: "k"
  timeout_secs: 30
pipeline:
  min_question_chars: 10
"#,
    )?;
    env::set_var("PORT", "9999");
    env::set_var("KIDCARE_PROVIDER__TIMEOUT_SECS", "7");
    env::set_var("KIDCARE_PIPELINE__MIN_QUESTION_CHARS", "20");
    env::set_var("KIDCARE_GENERATION__OUTPUT_FORMAT", "text");

    let config = get_config(path.to_str())?;

    assert_eq!(config.port, 9999);
    assert_eq!(config.provider.timeout_secs, 7);
    assert_eq!(config.pipeline.min_question_chars, 20);
    assert_eq!(config.pipeline.fetch_limit, 20);
    assert_eq!(config.generation.output_format, OutputFormat::Text);

    clear_env_vars();
    Ok(())
}

#[test]
#[serial]
fn test_prompt_overrides_from_file() -> Result<()> {
    clear_env_vars();
    let (_dir, path) = write_config(
        r#"
provider:
  provider: "local"
  api_url: "http://localhost:8080/v1/chat/completions"
  models: ["llama"]
prompts:
  system: "Answer like a calm nurse."
"#,
    )?;

    let config = get_config(path.to_str())?;
    let settings = config.generation_settings();

    assert_eq!(settings.models, vec!["llama"]);
    assert_eq!(settings.templates.system, "Answer like a calm nurse.");
    assert_eq!(settings.templates.minimal_user, MINIMAL_ANSWER_USER_PROMPT);
    Ok(())
}

#[test]
#[serial]
fn test_relative_seed_file_resolves_against_config_dir() -> Result<()> {
    clear_env_vars();
    let (dir, path) = write_config(
        r#"
faq_seed_file: "faqs.yml"
provider:
  provider: "gemini"
  api_key: "k"
"#,
    )?;

    let config = get_config(path.to_str())?;

    let expected = dir.path().join("faqs.yml");
    assert_eq!(config.faq_seed_file.map(PathBuf::from), Some(expected));
    Ok(())
}

#[test]
#[serial]
fn test_missing_config_file_is_not_found() {
    clear_env_vars();
    let result = get_config(Some("/definitely/not/here/config.yml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}
