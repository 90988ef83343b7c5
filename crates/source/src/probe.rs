//! Structural probes used by version detection and the connection test.

use async_trait::async_trait;
use sqlx::mysql::MySqlConnection;

use crate::connection::{connect, release};
use crate::descriptor::SourceDescriptor;
use crate::error::SourceError;

/// Read-only questions about the source schema.
#[async_trait]
pub trait SchemaProbe: Send {
    /// Raw value of the installation's version setting, if stored.
    async fn settings_version(&mut self) -> Result<Option<String>, SourceError>;

    /// Number of tables whose name matches a SQL `LIKE` pattern.
    async fn count_tables(&mut self, pattern: &str) -> Result<i64, SourceError>;

    async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, SourceError>;

    async fn table_exists(&mut self, pattern: &str) -> Result<bool, SourceError> {
        Ok(self.count_tables(pattern).await? > 0)
    }
}

/// [`SchemaProbe`] over one open source connection.
pub struct MySqlProbe {
    conn: MySqlConnection,
}

impl MySqlProbe {
    pub async fn open(descriptor: &SourceDescriptor) -> Result<Self, SourceError> {
        Ok(Self {
            conn: connect(descriptor).await?,
        })
    }

    pub async fn close(self) {
        release(self.conn).await;
    }
}

#[async_trait]
impl SchemaProbe for MySqlProbe {
    async fn settings_version(&mut self) -> Result<Option<String>, SourceError> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT value FROM cscart_settings WHERE name = 'version' LIMIT 1")
                .fetch_optional(&mut self.conn)
                .await?;
        Ok(value.map(|(v,)| v))
    }

    async fn count_tables(&mut self, pattern: &str) -> Result<i64, SourceError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = DATABASE() AND table_name LIKE ?",
        )
        .bind(pattern)
        .fetch_one(&mut self.conn)
        .await?;
        Ok(count)
    }

    async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, SourceError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM information_schema.columns
             WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?",
        )
        .bind(table)
        .bind(column)
        .fetch_one(&mut self.conn)
        .await?;
        Ok(count > 0)
    }
}
