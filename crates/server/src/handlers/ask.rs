//! # Ask Handlers
//!
//! The question-answering endpoint. The body is parsed leniently and handed
//! to the answer pipeline; the pipeline's result is reshaped into the public
//! response format.

use super::{AppError, AppState};
use crate::types::{lenient_json, parse_ask, AskResponse};
use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

/// `GET /api/ask`: a liveness probe for clients of the ask endpoint.
pub async fn ask_status() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// `POST /api/ask`: answers a parent's question.
pub async fn ask_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<AskResponse>, AppError> {
    let question = parse_ask(&lenient_json(&body));
    info!(
        age_months = question.age_months,
        chars = question.text.chars().count(),
        "Received question"
    );

    let result = app_state.pipeline.answer(question).await?;
    info!(source = %result.source, urgent = result.urgent, path = ?result.path, "Answered question");

    Ok(Json(AskResponse::from(result)))
}
