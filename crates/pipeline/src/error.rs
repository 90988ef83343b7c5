//! Target-store failures.

use cartshift_core::migration::MigrationError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write addressed a row that does not exist anymore.
    #[error("{entity} {id} not found")]
    Missing { entity: &'static str, id: i64 },

    /// Failure reported by a non-SQL store implementation.
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for MigrationError {
    fn from(err: StoreError) -> Self {
        MigrationError::Unexpected(err.to_string())
    }
}
