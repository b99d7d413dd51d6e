//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `kidcare-server`.
//! The handlers are split into logical sub-modules based on their functionality.

// Sub-modules for different handler categories.
pub mod ask;
pub mod feedback;
pub mod general;
pub mod models;

// Re-export all handlers from the sub-modules to make them easily accessible
// to the router under a single `handlers::` path.
pub use ask::*;
pub use feedback::*;
pub use general::*;
pub use models::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
