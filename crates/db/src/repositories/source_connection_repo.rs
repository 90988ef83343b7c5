//! Repository for the `source_connections` table.

use cartshift_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use cartshift_core::types::DbId;
use sqlx::PgPool;

use crate::models::source_connection::{CreateSourceConnection, SourceConnection};

/// Column list for source_connections queries.
const COLUMNS: &str = "id, name, host, port, database_name, username, password, \
    schema_version, language_code, is_active, last_sync_at, last_detected_version, \
    last_test_at, last_status, created_at, updated_at";

/// Provides CRUD operations for source connections.
pub struct SourceConnectionRepo;

impl SourceConnectionRepo {
    /// Insert a new connection, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSourceConnection,
    ) -> Result<SourceConnection, sqlx::Error> {
        let query = format!(
            "INSERT INTO source_connections
                (name, host, port, database_name, username, password, schema_version, language_code)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SourceConnection>(&query)
            .bind(&input.name)
            .bind(input.host.trim())
            .bind(input.port_or_default())
            .bind(&input.database_name)
            .bind(&input.username)
            .bind(&input.password)
            .bind(input.schema_version_or_auto())
            .bind(input.language_code_or_default())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SourceConnection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM source_connections WHERE id = $1");
        sqlx::query_as::<_, SourceConnection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List connections, newest first.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<SourceConnection>, sqlx::Error> {
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        let offset = clamp_offset(offset);
        let query = format!(
            "SELECT {COLUMNS} FROM source_connections
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, SourceConnection>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Stamp the last successful synchronisation time.
    pub async fn mark_synced(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE source_connections SET last_sync_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Remember the version an `auto` connection resolved to.
    pub async fn record_detected_version(
        pool: &PgPool,
        id: DbId,
        version: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE source_connections SET last_detected_version = $2 WHERE id = $1")
            .bind(id)
            .bind(version)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record the outcome of a connection test.
    pub async fn record_test(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE source_connections SET last_test_at = NOW(), last_status = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(())
    }
}
