use super::AppState;
use crate::types::{lenient_json, parse_feedback};
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{error, info};

/// `POST /api/feedback`: records whether an answer was helpful.
///
/// This endpoint reports failures as `{ ok: false, error }` rather than
/// through `AppError`, matching its success shape.
pub async fn feedback_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Some(feedback) = parse_feedback(&lenient_json(&body)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "was_helpful is required (boolean)" })),
        );
    };

    match app_state.pipeline.store().insert_feedback(&feedback).await {
        Ok(()) => {
            info!(was_helpful = feedback.was_helpful, "Feedback recorded");
            (StatusCode::OK, Json(json!({ "ok": true })))
        }
        Err(e) => {
            error!("Feedback insert failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}
