//! Handlers for the `/connections` resource.
//!
//! A connection is a persisted legacy database descriptor. Besides
//! registration it offers a connectivity test and the run history of
//! every migration executed against it.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use cartshift_core::error::CoreError;
use cartshift_core::export::{render_runs_csv, EXPORT_FILE_NAME};
use cartshift_core::schema_version::validate_declared_version;
use cartshift_core::types::DbId;
use cartshift_db::models::migration_run::RunListQuery;
use cartshift_db::models::source_connection::{
    validate_host, CreateSourceConnection, SourceConnection, DEFAULT_SOURCE_PORT,
};
use cartshift_db::repositories::{MigrationRunRepo, SourceConnectionRepo};
use cartshift_pipeline::pg::descriptor_from_connection;
use cartshift_source::{test_connection, SourceDescriptor};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_connection(pool: &sqlx::PgPool, id: DbId) -> AppResult<SourceConnection> {
    SourceConnectionRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SourceConnection",
            id,
        }))
}

/// Connection parameters for a test that is not stored.
#[derive(Debug, Deserialize, Validate)]
pub struct TestConnectionRequest {
    #[validate(custom(function = "validate_host"))]
    pub host: String,
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: Option<i32>,
    #[validate(length(min = 1, message = "Database name is required"))]
    pub database_name: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl TestConnectionRequest {
    fn descriptor(&self) -> AppResult<SourceDescriptor> {
        let port = self.port.unwrap_or(DEFAULT_SOURCE_PORT);
        let port = u16::try_from(port)
            .map_err(|_| CoreError::Validation(format!("Invalid port {port}")))?;
        Ok(SourceDescriptor::new(
            self.host.trim(),
            port,
            &self.database_name,
            &self.username,
            &self.password,
        ))
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// POST /api/v1/connections
///
/// Register a legacy database. `schema_version` defaults to `auto`.
pub async fn create_connection(
    State(state): State<AppState>,
    Json(input): Json<CreateSourceConnection>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_declared_version(input.schema_version_or_auto())
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let connection = SourceConnectionRepo::create(&state.pool, &input).await?;

    tracing::info!(
        connection_id = connection.id,
        host = %connection.host,
        schema_version = %connection.schema_version,
        "Source connection registered",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: connection })))
}

/// GET /api/v1/connections/{id}
pub async fn get_connection(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let connection = find_connection(&state.pool, id).await?;
    Ok(Json(DataResponse { data: connection }))
}

// ---------------------------------------------------------------------------
// Connectivity tests
// ---------------------------------------------------------------------------

/// POST /api/v1/connections/test
///
/// Test parameters before saving them. A failed connect is reported in
/// the body with `success: false`, not as an HTTP error.
pub async fn test_connection_params(
    Json(input): Json<TestConnectionRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let descriptor = input.descriptor()?;

    let report = test_connection(&descriptor).await;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/connections/{id}/test
///
/// Test a stored connection and remember the outcome on it.
pub async fn test_stored_connection(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let connection = find_connection(&state.pool, id).await?;
    let descriptor = descriptor_from_connection(&connection)?;

    let report = test_connection(&descriptor).await;
    let status = if report.success { "success" } else { "failed" };
    SourceConnectionRepo::record_test(&state.pool, id, status).await?;

    tracing::info!(connection_id = id, status, "Source connection tested");

    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// Run history
// ---------------------------------------------------------------------------

/// GET /api/v1/connections/{id}/runs
///
/// Run history, newest first. Accepts `limit` and `offset`.
pub async fn list_runs(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<RunListQuery>,
) -> AppResult<impl IntoResponse> {
    find_connection(&state.pool, id).await?;
    let runs =
        MigrationRunRepo::list_by_connection(&state.pool, id, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: runs }))
}

/// GET /api/v1/connections/{id}/runs/export
///
/// Full run history as a CSV attachment.
pub async fn export_runs(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_connection(&state.pool, id).await?;
    let runs = MigrationRunRepo::list_all_by_connection(&state.pool, id).await?;
    let rows: Vec<_> = runs.iter().filter_map(|r| r.to_export_row()).collect();
    let body = render_runs_csv(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={EXPORT_FILE_NAME}"),
            ),
        ],
        body,
    ))
}
