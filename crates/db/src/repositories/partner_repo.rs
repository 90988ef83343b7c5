//! Repository for the `partners` table.

use cartshift_core::mapping::PartnerRecord;
use cartshift_core::types::{DbId, ExternalId};
use sqlx::PgPool;

use crate::models::partner::Partner;

/// Column list for partners queries.
const COLUMNS: &str = "id, external_id, name, email, phone, mobile, street, city, zip, \
    country_id, state_id, company_name, customer_rank, supplier_rank, is_company, active, \
    created_at, updated_at";

/// Provides persistence for partners.
pub struct PartnerRepo;

impl PartnerRepo {
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: ExternalId,
    ) -> Result<Option<Partner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM partners WHERE external_id = $1");
        sqlx::query_as::<_, Partner>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn insert(pool: &PgPool, record: &PartnerRecord) -> Result<Partner, sqlx::Error> {
        let query = format!(
            "INSERT INTO partners
                (external_id, name, email, phone, mobile, street, city, zip, country_id,
                 state_id, company_name, customer_rank, supplier_rank, is_company, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Partner>(&query)
            .bind(record.external_id)
            .bind(&record.name)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(&record.mobile)
            .bind(&record.street)
            .bind(&record.city)
            .bind(&record.zip)
            .bind(record.country_id)
            .bind(record.state_id)
            .bind(&record.company_name)
            .bind(record.customer_rank)
            .bind(record.supplier_rank)
            .bind(record.is_company)
            .bind(record.active)
            .fetch_one(pool)
            .await
    }

    /// Overwrite every mapped field of an existing partner.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        record: &PartnerRecord,
    ) -> Result<Option<Partner>, sqlx::Error> {
        let query = format!(
            "UPDATE partners SET
                name = $2,
                email = $3,
                phone = $4,
                mobile = $5,
                street = $6,
                city = $7,
                zip = $8,
                country_id = $9,
                state_id = $10,
                company_name = $11,
                customer_rank = $12,
                supplier_rank = $13,
                is_company = $14,
                active = $15
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Partner>(&query)
            .bind(id)
            .bind(&record.name)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(&record.mobile)
            .bind(&record.street)
            .bind(&record.city)
            .bind(&record.zip)
            .bind(record.country_id)
            .bind(record.state_id)
            .bind(&record.company_name)
            .bind(record.customer_rank)
            .bind(record.supplier_rank)
            .bind(record.is_company)
            .bind(record.active)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM partners")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
