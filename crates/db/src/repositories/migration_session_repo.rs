//! Repository for the `migration_sessions` table.
//!
//! A session is written by exactly one party at a time: the API while it is
//! `draft`, the claiming worker once it is `in_progress`.

use cartshift_core::migration::{EntityType, SessionState};
use cartshift_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use cartshift_core::types::DbId;
use sqlx::PgPool;

use crate::models::migration_session::{CreateMigrationSession, MigrationSession};

/// Column list for migration_sessions queries.
const COLUMNS: &str = "id, connection_id, name, state, import_categories, import_products, \
    import_customers, import_suppliers, update_existing, batch_size, language_code, progress, \
    current_operation, log_message, categories_imported, products_imported, customers_imported, \
    suppliers_imported, resolved_version, retry_of, claimed_at, start_time, end_time, \
    created_at, updated_at";

/// First line of every session log.
pub const SESSION_STARTED_LOG: &str = "Migration started...\n";

/// Appended to the log of a session released by [`MigrationSessionRepo::fail_stale`].
pub const STALE_SESSION_LOG: &str =
    "\nMigration interrupted: the worker stopped before the session finished.\n";

/// A claimed session with no snapshot write for this long counts as
/// abandoned by its worker.
pub const STALE_SESSION_SECS: f64 = 6.0 * 60.0 * 60.0;

/// Provides persistence for migration sessions.
pub struct MigrationSessionRepo;

impl MigrationSessionRepo {
    /// Insert a new draft session.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMigrationSession,
        default_name: &str,
        retry_of: Option<DbId>,
    ) -> Result<MigrationSession, sqlx::Error> {
        let name = input.name.as_deref().unwrap_or(default_name);
        let language_code = input
            .language_code
            .as_deref()
            .unwrap_or(cartshift_core::migration::DEFAULT_LANGUAGE_CODE);
        let query = format!(
            "INSERT INTO migration_sessions
                (connection_id, name, import_categories, import_products, import_customers,
                 import_suppliers, update_existing, batch_size, language_code, retry_of)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationSession>(&query)
            .bind(input.connection_id)
            .bind(name)
            .bind(input.import_categories())
            .bind(input.import_products())
            .bind(input.import_customers())
            .bind(input.import_suppliers())
            .bind(input.update_existing())
            .bind(input.batch_size())
            .bind(language_code)
            .bind(retry_of)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MigrationSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM migration_sessions WHERE id = $1");
        sqlx::query_as::<_, MigrationSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Sessions of a connection, newest first.
    pub async fn list_by_connection(
        pool: &PgPool,
        connection_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<MigrationSession>, sqlx::Error> {
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        let offset = clamp_offset(offset);
        let query = format!(
            "SELECT {COLUMNS} FROM migration_sessions
             WHERE connection_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, MigrationSession>(&query)
            .bind(connection_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Move a draft session to `in_progress` so a worker can pick it up.
    ///
    /// Returns `None` if the session is not a draft anymore.
    pub async fn enqueue(pool: &PgPool, id: DbId) -> Result<Option<MigrationSession>, sqlx::Error> {
        let query = format!(
            "UPDATE migration_sessions SET
                state = 'in_progress',
                start_time = NOW(),
                end_time = NULL,
                claimed_at = NULL,
                progress = 0,
                current_operation = '',
                log_message = $2
             WHERE id = $1 AND state = 'draft'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationSession>(&query)
            .bind(id)
            .bind(SESSION_STARTED_LOG)
            .fetch_optional(pool)
            .await
    }

    /// Atomically claim the oldest unclaimed in-progress session.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<MigrationSession>, sqlx::Error> {
        let query = format!(
            "UPDATE migration_sessions SET claimed_at = NOW()
             WHERE id = (
                SELECT id FROM migration_sessions
                WHERE state = 'in_progress' AND claimed_at IS NULL
                ORDER BY created_at, id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationSession>(&query)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        progress: f64,
        current_operation: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE migration_sessions SET progress = $2, current_operation = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(progress)
        .bind(current_operation)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Append text to the cumulative session log.
    pub async fn append_log(pool: &PgPool, id: DbId, message: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE migration_sessions SET log_message = log_message || $2 WHERE id = $1")
            .bind(id)
            .bind(message)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Store the number of records imported for one entity type.
    pub async fn set_imported_count(
        pool: &PgPool,
        id: DbId,
        entity_type: EntityType,
        count: i32,
    ) -> Result<(), sqlx::Error> {
        let column = match entity_type {
            EntityType::Category => "categories_imported",
            EntityType::Product => "products_imported",
            EntityType::Customer => "customers_imported",
            EntityType::Supplier => "suppliers_imported",
        };
        let query = format!("UPDATE migration_sessions SET {column} = $2 WHERE id = $1");
        sqlx::query(&query)
            .bind(id)
            .bind(count)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_resolved_version(
        pool: &PgPool,
        id: DbId,
        version: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE migration_sessions SET resolved_version = $2 WHERE id = $1")
            .bind(id)
            .bind(version)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Set a terminal state and the end time. Progress is only overwritten
    /// when given.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        state: SessionState,
        progress: Option<f64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE migration_sessions SET
                state = $2,
                progress = COALESCE($3, progress),
                end_time = NOW()
             WHERE id = $1 AND state = 'in_progress'",
        )
        .bind(id)
        .bind(state.as_str())
        .bind(progress)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark the session owning `run_id` as alive.
    pub async fn touch_for_run(pool: &PgPool, run_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE migration_sessions SET updated_at = NOW()
             WHERE id = (SELECT session_id FROM migration_runs WHERE id = $1)",
        )
        .bind(run_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fail a claimed session whose snapshot has not moved for
    /// `stale_after_secs`, so it can be retried after its worker died.
    ///
    /// Returns `None` when the session is not claimed or still active.
    pub async fn fail_stale(
        pool: &PgPool,
        id: DbId,
        stale_after_secs: f64,
    ) -> Result<Option<MigrationSession>, sqlx::Error> {
        let query = format!(
            "UPDATE migration_sessions SET
                state = 'failed',
                end_time = NOW(),
                log_message = log_message || $3
             WHERE id = $1
                AND state = 'in_progress'
                AND claimed_at IS NOT NULL
                AND updated_at <= NOW() - make_interval(secs => $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationSession>(&query)
            .bind(id)
            .bind(stale_after_secs)
            .bind(STALE_SESSION_LOG)
            .fetch_optional(pool)
            .await
    }
}
