//! # Common Test Utilities
//!
//! This module centralizes the test harness used across the `kidcare-server`
//! integration tests. `TestApp` spawns a real server on a random port with a
//! temporary SQLite database, and points the Gemini provider at an
//! `httpmock::MockServer`.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::{prelude::*, Mock};
use kidcare::{
    providers::db::storage::FaqStore,
    types::{FaqEntry, NewFaq},
};
use kidcare_server::{
    config, router,
    state::{build_app_state, AppState},
};
use reqwest::Client;
use serde_json::{json, Value};
use std::{fs, net::SocketAddr};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::net::TcpListener;

pub const MODEL_A: &str = "model-a";
pub const MODEL_B: &str = "model-b";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _db_file: NamedTempFile,
    _config_dir: TempDir,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server with an empty FAQ table.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_seed(None).await
    }

    /// Spawns the application server, optionally seeding FAQs from YAML through
    /// the `faq_seed_file` setting.
    pub async fn spawn_with_seed(seed_yaml: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start_async().await;
        let db_file = NamedTempFile::new()?;
        let config_dir = tempdir()?;

        let seed_line = match seed_yaml {
            Some(yaml) => {
                fs::write(config_dir.path().join("faqs.yml"), yaml)?;
                "faq_seed_file: \"faqs.yml\"".to_string()
            }
            None => String::new(),
        };

        let config_content = format!(
            r#"
port: 0
db_url: "{}"
{}
provider:
  provider: "gemini"
  api_url: "{}"
  api_key: "test-key"
  models: ["{MODEL_A}", "{MODEL_B}"]
  timeout_secs: 5
generation:
  output_format: "text"
"#,
            db_file.path().display(),
            seed_line,
            mock_server.url("/v1beta"),
        );
        let config_path = config_dir.path().join("config.yml");
        fs::write(&config_path, config_content)?;

        let config = config::get_config(Some(&config_path.to_string_lossy()))?;
        let app_state = build_app_state(config).await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let app = router::create_router(app_state.clone());
        tokio::spawn(async move {
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state,
            _db_file: db_file,
            _config_dir: config_dir,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Posts a JSON body to `/api/ask`.
    pub async fn ask(&self, body: Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}/api/ask", self.address))
            .json(&body)
            .send()
            .await?)
    }

    /// Inserts an FAQ entry directly into the store.
    pub async fn add_faq(
        &self,
        age_min: i64,
        age_max: i64,
        category: &str,
        question: &str,
        answer: &str,
    ) -> Result<FaqEntry> {
        Ok(self
            .app_state
            .sqlite_provider
            .insert_faq(NewFaq {
                age_min,
                age_max,
                category: Some(category.to_string()),
                question: question.to_string(),
                answer: answer.to_string(),
                source: None,
            })
            .await?)
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        kidcare_test_utils::count_rows(&self.app_state.sqlite_provider, table).await
    }

    /// Mocks a successful `generateContent` call for `model`.
    pub async fn mock_generation(&self, model: &str, text: &str) -> Mock<'_> {
        self.mock_server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/v1beta/models/{model}:generateContent"))
                    .query_param("key", "test-key");
                then.status(200).json_body(json!({
                    "candidates": [{"content": {"parts": [{"text": text}]}}]
                }));
            })
            .await
    }

    /// Mocks a Gemini API error for every `generateContent` call.
    pub async fn mock_generation_error(&self, status: u16, message: &str) -> Mock<'_> {
        self.mock_server
            .mock_async(|when, then| {
                when.method(POST).path_contains(":generateContent");
                then.status(status)
                    .json_body(json!({"error": {"code": status, "message": message}}));
            })
            .await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
