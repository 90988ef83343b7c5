//! Source-side failures and their place in the migration error taxonomy.

use cartshift_core::migration::MigrationError;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The server could not be reached or refused the credentials.
    #[error("{0}")]
    Connect(String),

    #[error("connection attempt timed out after {0} seconds")]
    ConnectTimeout(u64),

    /// A statement failed on an established connection.
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl SourceError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::ConnectTimeout(_))
    }
}

impl From<SourceError> for MigrationError {
    fn from(err: SourceError) -> Self {
        if err.is_connectivity() {
            MigrationError::Connectivity {
                cause: err.to_string(),
            }
        } else {
            MigrationError::Unexpected(err.to_string())
        }
    }
}
