pub mod connections;
pub mod health;
pub mod migrations;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /connections                        register
/// /connections/test                   ad-hoc connection test
/// /connections/{id}                   get
/// /connections/{id}/test              stored connection test
/// /connections/{id}/runs              run history
/// /connections/{id}/runs/export       run history as CSV
///
/// /migrations                         trigger (202)
/// /migrations/{id}/status             status snapshot
/// /migrations/{id}/runs               runs of a session
/// /migrations/{id}/retry              retry a finished session
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/connections", connections::router())
        .nest("/migrations", migrations::router())
}
