//! Partner model (customers and suppliers).

use cartshift_core::types::{DbId, ExternalId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `partners` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Partner {
    pub id: DbId,
    pub external_id: ExternalId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub street: String,
    pub city: String,
    pub zip: String,
    pub country_id: Option<DbId>,
    pub state_id: Option<DbId>,
    pub company_name: String,
    pub customer_rank: i32,
    pub supplier_rank: i32,
    pub is_company: bool,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
