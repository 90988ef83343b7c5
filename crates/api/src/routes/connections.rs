//! Route definitions for the `/connections` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::connections;
use crate::state::AppState;

/// Routes mounted at `/connections`.
///
/// ```text
/// POST   /                    -> create_connection
/// POST   /test                -> test_connection_params
/// GET    /{id}                -> get_connection
/// POST   /{id}/test           -> test_stored_connection
/// GET    /{id}/runs           -> list_runs
/// GET    /{id}/runs/export    -> export_runs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(connections::create_connection))
        .route("/test", post(connections::test_connection_params))
        .route("/{id}", get(connections::get_connection))
        .route("/{id}/test", post(connections::test_stored_connection))
        .route("/{id}/runs", get(connections::list_runs))
        .route("/{id}/runs/export", get(connections::export_runs))
}
