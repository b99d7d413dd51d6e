use super::{handlers, state::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route(
            "/api/ask",
            get(handlers::ask_status).post(handlers::ask_handler),
        )
        .route("/api/feedback", post(handlers::feedback_handler))
        .route("/api/models", get(handlers::models_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
