//! Repository for the `products` table.

use cartshift_core::mapping::ProductRecord;
use cartshift_core::types::{DbId, ExternalId};
use sqlx::PgPool;

use crate::models::product::Product;

/// Column list for products queries.
const COLUMNS: &str = "id, external_id, category_id, name, default_code, description, \
    description_sale, list_price, standard_price, weight, volume, active, sale_ok, \
    purchase_ok, created_at, updated_at";

/// Provides persistence for products.
pub struct ProductRepo;

impl ProductRepo {
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: ExternalId,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE external_id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn insert(pool: &PgPool, record: &ProductRecord) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products
                (external_id, category_id, name, default_code, description, description_sale,
                 list_price, standard_price, weight, volume, active, sale_ok, purchase_ok)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(record.external_id)
            .bind(record.category_id)
            .bind(&record.name)
            .bind(&record.default_code)
            .bind(&record.description)
            .bind(&record.description_sale)
            .bind(record.list_price)
            .bind(record.standard_price)
            .bind(record.weight)
            .bind(record.volume)
            .bind(record.active)
            .bind(record.sale_ok)
            .bind(record.purchase_ok)
            .fetch_one(pool)
            .await
    }

    /// Overwrite every mapped field of an existing product.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        record: &ProductRecord,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                category_id = $2,
                name = $3,
                default_code = $4,
                description = $5,
                description_sale = $6,
                list_price = $7,
                standard_price = $8,
                weight = $9,
                volume = $10,
                active = $11,
                sale_ok = $12,
                purchase_ok = $13
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(record.category_id)
            .bind(&record.name)
            .bind(&record.default_code)
            .bind(&record.description)
            .bind(&record.description_sale)
            .bind(record.list_price)
            .bind(record.standard_price)
            .bind(record.weight)
            .bind(record.volume)
            .bind(record.active)
            .bind(record.sale_ok)
            .bind(record.purchase_ok)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
