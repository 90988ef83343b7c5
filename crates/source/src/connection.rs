//! Scoped connections with a bounded connect timeout.

use std::time::Duration;

use sqlx::mysql::MySqlConnection;
use sqlx::Connection;

use crate::descriptor::SourceDescriptor;
use crate::error::SourceError;

/// Upper bound for establishing a source connection. No other timeout is
/// applied to source queries.
pub const SOURCE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a single connection to the source.
pub async fn connect(descriptor: &SourceDescriptor) -> Result<MySqlConnection, SourceError> {
    let options = descriptor.connect_options();
    match tokio::time::timeout(SOURCE_CONNECT_TIMEOUT, MySqlConnection::connect_with(&options)).await
    {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(SourceError::Connect(e.to_string())),
        Err(_) => Err(SourceError::ConnectTimeout(SOURCE_CONNECT_TIMEOUT.as_secs())),
    }
}

/// Close a connection, logging instead of failing. Dropping the connection
/// would release it as well; closing tells the server right away.
pub async fn release(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "Source connection did not close cleanly");
    }
}
