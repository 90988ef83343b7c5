//! Product model.

use cartshift_core::types::{DbId, ExternalId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `products` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: DbId,
    pub external_id: ExternalId,
    pub category_id: DbId,
    pub name: String,
    pub default_code: String,
    pub description: String,
    pub description_sale: String,
    pub list_price: f64,
    pub standard_price: f64,
    pub weight: f64,
    pub volume: f64,
    pub active: bool,
    pub sale_ok: bool,
    pub purchase_ok: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
