//! Country and state reference data.

use cartshift_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `countries` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Country {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `country_states` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CountryState {
    pub id: DbId,
    pub country_id: DbId,
    pub code: String,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
