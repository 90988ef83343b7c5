//! Product category model.

use cartshift_core::types::{DbId, ExternalId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Name of the category unmapped products fall into.
pub const CATCH_ALL_CATEGORY_NAME: &str = "All";

/// A row from the `product_categories` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductCategory {
    pub id: DbId,
    /// `None` only for categories that did not come from the legacy store.
    pub external_id: Option<ExternalId>,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub is_catch_all: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
