//! Connectivity check offered to operators before a migration.

use cartshift_core::migration::CONNECTIVITY_CHECKLIST;
use serde::Serialize;

use crate::descriptor::SourceDescriptor;
use crate::probe::{MySqlProbe, SchemaProbe};

/// `LIKE` pattern of the legacy tables (escaped underscore).
pub const LEGACY_TABLE_PATTERN: &str = "cscart\\_%";

/// Outcome of [`test_connection`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionTestReport {
    pub success: bool,
    pub message: String,
    pub table_count: i64,
    /// Raw version setting, when readable.
    pub version: Option<String>,
}

/// Connect, count legacy tables and read the version setting.
///
/// Only the connect step decides `success`; later probe failures are
/// reported in the message.
pub async fn test_connection(descriptor: &SourceDescriptor) -> ConnectionTestReport {
    let mut probe = match MySqlProbe::open(descriptor).await {
        Ok(p) => p,
        Err(e) => {
            tracing::info!(host = %descriptor.host, error = %e, "Source connection test failed");
            return failure_report(&e.to_string());
        }
    };
    let report = probe_report(&mut probe).await;
    probe.close().await;
    report
}

pub(crate) fn failure_report(cause: &str) -> ConnectionTestReport {
    ConnectionTestReport {
        success: false,
        message: format!("Connection failed: {cause}\n\n{CONNECTIVITY_CHECKLIST}"),
        table_count: 0,
        version: None,
    }
}

/// Report for an established connection.
pub(crate) async fn probe_report<P: SchemaProbe + ?Sized>(probe: &mut P) -> ConnectionTestReport {
    let version = probe.settings_version().await.ok().flatten();
    match probe.count_tables(LEGACY_TABLE_PATTERN).await {
        Ok(count) => ConnectionTestReport {
            success: true,
            message: format!("Connection successful! Found {count} legacy tables."),
            table_count: count,
            version,
        },
        Err(e) => ConnectionTestReport {
            success: true,
            message: format!("Connection successful, but legacy tables could not be listed: {e}"),
            table_count: 0,
            version,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;

    struct CountingProbe(Result<i64, ()>);

    #[async_trait]
    impl SchemaProbe for CountingProbe {
        async fn settings_version(&mut self) -> Result<Option<String>, SourceError> {
            Ok(Some("4.12.1".into()))
        }

        async fn count_tables(&mut self, _pattern: &str) -> Result<i64, SourceError> {
            self.0.map_err(|_| SourceError::Query(sqlx::Error::RowNotFound))
        }

        async fn column_exists(&mut self, _t: &str, _c: &str) -> Result<bool, SourceError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn counts_legacy_tables() {
        let report = probe_report(&mut CountingProbe(Ok(212))).await;
        assert!(report.success);
        assert_eq!(report.table_count, 212);
        assert!(report.message.contains("212"));
        assert_eq!(report.version.as_deref(), Some("4.12.1"));
    }

    #[tokio::test]
    async fn listing_failure_is_still_connected() {
        let report = probe_report(&mut CountingProbe(Err(()))).await;
        assert!(report.success);
        assert_eq!(report.table_count, 0);
        assert!(report.message.contains("could not be listed"));
    }

    #[test]
    fn failure_includes_checklist() {
        let report = failure_report("Access denied");
        assert!(!report.success);
        assert!(report.message.contains("Access denied"));
        assert!(report.message.contains("Username and password are correct"));
    }
}
