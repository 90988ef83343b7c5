//! Repository for the `product_categories` table.

use cartshift_core::mapping::CategoryRecord;
use cartshift_core::types::{DbId, ExternalId};
use sqlx::PgPool;

use crate::models::category::{ProductCategory, CATCH_ALL_CATEGORY_NAME};

/// Column list for product_categories queries.
const COLUMNS: &str = "id, external_id, parent_id, name, description, active, is_catch_all, \
    created_at, updated_at";

/// Provides persistence for product categories.
pub struct CategoryRepo;

impl CategoryRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProductCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM product_categories WHERE id = $1");
        sqlx::query_as::<_, ProductCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: ExternalId,
    ) -> Result<Option<ProductCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM product_categories WHERE external_id = $1");
        sqlx::query_as::<_, ProductCategory>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a migrated category, stamping its external id.
    pub async fn insert(
        pool: &PgPool,
        record: &CategoryRecord,
    ) -> Result<ProductCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO product_categories (external_id, parent_id, name, description, active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductCategory>(&query)
            .bind(record.external_id)
            .bind(record.parent_id)
            .bind(&record.name)
            .bind(&record.description)
            .bind(record.active)
            .fetch_one(pool)
            .await
    }

    /// Overwrite every mapped field of an existing category.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        record: &CategoryRecord,
    ) -> Result<Option<ProductCategory>, sqlx::Error> {
        let query = format!(
            "UPDATE product_categories SET
                parent_id = $2,
                name = $3,
                description = $4,
                active = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductCategory>(&query)
            .bind(id)
            .bind(record.parent_id)
            .bind(&record.name)
            .bind(&record.description)
            .bind(record.active)
            .fetch_optional(pool)
            .await
    }

    /// Return the catch-all category, creating it on first use.
    pub async fn find_or_create_catch_all(pool: &PgPool) -> Result<ProductCategory, sqlx::Error> {
        let insert = "INSERT INTO product_categories (name, is_catch_all)
             VALUES ($1, TRUE)
             ON CONFLICT (is_catch_all) WHERE is_catch_all DO NOTHING";
        sqlx::query(insert)
            .bind(CATCH_ALL_CATEGORY_NAME)
            .execute(pool)
            .await?;

        let query = format!("SELECT {COLUMNS} FROM product_categories WHERE is_catch_all");
        sqlx::query_as::<_, ProductCategory>(&query)
            .fetch_one(pool)
            .await
    }

    /// `(external_id, id)` pairs of every migrated category.
    pub async fn external_index(pool: &PgPool) -> Result<Vec<(ExternalId, DbId)>, sqlx::Error> {
        sqlx::query_as::<_, (ExternalId, DbId)>(
            "SELECT external_id, id FROM product_categories WHERE external_id IS NOT NULL",
        )
        .fetch_all(pool)
        .await
    }

    /// Number of migrated categories.
    pub async fn count_migrated(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_categories WHERE external_id IS NOT NULL")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
