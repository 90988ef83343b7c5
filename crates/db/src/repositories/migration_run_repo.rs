//! Repository for the `migration_runs` table.

use cartshift_core::migration::{RunCounters, RunStatus};
use cartshift_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use cartshift_core::types::DbId;
use sqlx::PgPool;

use crate::models::migration_run::{CreateMigrationRun, MigrationRun};

/// Column list for migration_runs queries.
const COLUMNS: &str = "id, connection_id, session_id, entity_type, status, start_date, \
    end_date, total_records, processed_records, successful_records, failed_records, \
    error_message, details, created_at, updated_at";

/// Provides persistence for migration runs.
pub struct MigrationRunRepo;

impl MigrationRunRepo {
    /// Open a run in `in_progress` with its start date stamped.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMigrationRun,
    ) -> Result<MigrationRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO migration_runs (connection_id, session_id, entity_type, status, start_date)
             VALUES ($1, $2, $3, 'in_progress', NOW())
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(input.connection_id)
            .bind(input.session_id)
            .bind(input.entity_type.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MigrationRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM migration_runs WHERE id = $1");
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Persist counters and the error log of a run in flight.
    ///
    /// Terminal runs are left untouched.
    pub async fn checkpoint(
        pool: &PgPool,
        id: DbId,
        counters: &RunCounters,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE migration_runs SET
                total_records = $2,
                processed_records = $3,
                successful_records = $4,
                failed_records = $5,
                error_message = $6
             WHERE id = $1 AND status = 'in_progress'",
        )
        .bind(id)
        .bind(counters.total)
        .bind(counters.processed)
        .bind(counters.successful)
        .bind(counters.failed)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Set the terminal status, final counters and end date.
    ///
    /// Returns `None` when the run was already terminal.
    pub async fn finalize(
        pool: &PgPool,
        id: DbId,
        status: RunStatus,
        counters: &RunCounters,
        error_message: Option<&str>,
        details: Option<&str>,
    ) -> Result<Option<MigrationRun>, sqlx::Error> {
        let query = format!(
            "UPDATE migration_runs SET
                status = $2,
                total_records = $3,
                processed_records = $4,
                successful_records = $5,
                failed_records = $6,
                error_message = $7,
                details = $8,
                end_date = NOW()
             WHERE id = $1 AND status = 'in_progress'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(counters.total)
            .bind(counters.processed)
            .bind(counters.successful)
            .bind(counters.failed)
            .bind(error_message)
            .bind(details)
            .fetch_optional(pool)
            .await
    }

    /// Run history of a connection, newest first.
    pub async fn list_by_connection(
        pool: &PgPool,
        connection_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<MigrationRun>, sqlx::Error> {
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        let offset = clamp_offset(offset);
        let query = format!(
            "SELECT {COLUMNS} FROM migration_runs
             WHERE connection_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(connection_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Full run history of a connection for export, newest first.
    pub async fn list_all_by_connection(
        pool: &PgPool,
        connection_id: DbId,
    ) -> Result<Vec<MigrationRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM migration_runs
             WHERE connection_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(connection_id)
            .fetch_all(pool)
            .await
    }

    /// Runs of one session in phase order.
    pub async fn list_by_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<MigrationRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM migration_runs
             WHERE session_id = $1
             ORDER BY id"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }
}
