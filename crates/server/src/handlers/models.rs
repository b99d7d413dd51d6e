use super::AppState;
use crate::types::ModelsResponse;
use axum::{extract::State, Json};
use tracing::warn;

/// `GET /api/models`: the configured model chain next to what the provider
/// reports as available. A failed listing is reported in `error`.
pub async fn models_handler(State(app_state): State<AppState>) -> Json<ModelsResponse> {
    let generation = app_state.pipeline.generation();
    let (available, error) = match generation.provider().list_models().await {
        Ok(models) => (models, None),
        Err(e) => {
            warn!("Listing provider models failed: {e}");
            (Vec::new(), Some(e.to_string()))
        }
    };

    Json(ModelsResponse {
        provider: generation.provider_name().to_string(),
        configured: generation.models().to_vec(),
        available,
        error,
    })
}
