//! Handlers for the `/migrations` resource.
//!
//! Triggering a migration only records a session and moves it to
//! `in_progress`; the session dispatcher picks it up and callers poll
//! `/migrations/{id}/status` for progress.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cartshift_core::error::CoreError;
use cartshift_core::types::DbId;
use cartshift_db::models::migration_session::{
    CreateMigrationSession, MigrationSession, SessionStatus,
};
use cartshift_db::repositories::migration_session_repo::STALE_SESSION_SECS;
use cartshift_db::repositories::{MigrationRunRepo, MigrationSessionRepo, SourceConnectionRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_session(pool: &sqlx::PgPool, id: DbId) -> AppResult<MigrationSession> {
    MigrationSessionRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "MigrationSession",
            id,
        }))
}

fn default_session_name() -> String {
    format!("Migration {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"))
}

/// Create a draft from `input` and hand it to the dispatcher.
async fn create_and_enqueue(
    pool: &sqlx::PgPool,
    input: &CreateMigrationSession,
    retry_of: Option<DbId>,
) -> AppResult<MigrationSession> {
    let draft = MigrationSessionRepo::create(pool, input, &default_session_name(), retry_of).await?;
    MigrationSessionRepo::enqueue(pool, draft.id)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!("Session {} left draft state before enqueue", draft.id))
        })
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// POST /api/v1/migrations
///
/// Start a migration session. Returns 202 with the initial status
/// snapshot; the import itself runs in the background.
pub async fn trigger_migration(
    State(state): State<AppState>,
    Json(input): Json<CreateMigrationSession>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if !input.has_any_entity() {
        return Err(AppError::Core(CoreError::Validation(
            "Please select at least one data type to import".into(),
        )));
    }
    let connection = SourceConnectionRepo::find_by_id(&state.pool, input.connection_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SourceConnection",
            id: input.connection_id,
        }))?;
    let input = input.with_default_language(&connection.language_code);

    let session = create_and_enqueue(&state.pool, &input, None).await?;

    tracing::info!(
        session_id = session.id,
        connection_id = session.connection_id,
        entity_types = ?session.enabled_entity_types(),
        "Migration session queued",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SessionStatus::from(&session),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/v1/migrations/{id}/status
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = find_session(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: SessionStatus::from(&session),
    }))
}

/// GET /api/v1/migrations/{id}/runs
///
/// Per-phase runs of a session in execution order.
pub async fn list_session_runs(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_session(&state.pool, id).await?;
    let runs = MigrationRunRepo::list_by_session(&state.pool, id).await?;
    Ok(Json(DataResponse { data: runs }))
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// POST /api/v1/migrations/{id}/retry
///
/// Queue a new session with the options of a finished one. Returns 409
/// while the original is still running; a claimed session with no
/// snapshot write for [`STALE_SESSION_SECS`] is failed and retried.
pub async fn retry_migration(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let original = find_session(&state.pool, id).await?;
    if !original.state().is_finished() {
        // A claimed session whose worker went silent is failed first.
        if MigrationSessionRepo::fail_stale(&state.pool, id, STALE_SESSION_SECS)
            .await?
            .is_none()
        {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Session {id} is {} and cannot be retried",
                original.state
            ))));
        }
        tracing::warn!(session_id = id, "Stale session failed before retry");
    }

    let session = create_and_enqueue(&state.pool, &original.to_retry(), Some(id)).await?;

    tracing::info!(session_id = session.id, retry_of = id, "Migration session retried");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SessionStatus::from(&session),
        }),
    ))
}
