//! Route definitions for the `/migrations` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::migrations;
use crate::state::AppState;

/// Routes mounted at `/migrations`.
///
/// ```text
/// POST   /                -> trigger_migration
/// GET    /{id}/status     -> get_status
/// GET    /{id}/runs       -> list_session_runs
/// POST   /{id}/retry      -> retry_migration
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(migrations::trigger_migration))
        .route("/{id}/status", get(migrations::get_status))
        .route("/{id}/runs", get(migrations::list_session_runs))
        .route("/{id}/retry", post(migrations::retry_migration))
}
