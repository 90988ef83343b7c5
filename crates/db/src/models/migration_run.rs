//! Migration run model: the persisted log of one phase.

use cartshift_core::export::RunExportRow;
use cartshift_core::migration::{EntityType, RunStatus};
use cartshift_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `migration_runs` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MigrationRun {
    pub id: DbId,
    pub connection_id: DbId,
    pub session_id: Option<DbId>,
    pub entity_type: String,
    pub status: String,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub total_records: i32,
    pub processed_records: i32,
    pub successful_records: i32,
    pub failed_records: i32,
    pub error_message: Option<String>,
    pub details: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MigrationRun {
    pub fn status(&self) -> RunStatus {
        RunStatus::from_str(&self.status).unwrap_or(RunStatus::Draft)
    }

    pub fn entity_type(&self) -> Option<EntityType> {
        EntityType::from_str(&self.entity_type)
    }

    /// Export rendering, `None` for rows with an unknown entity type.
    pub fn to_export_row(&self) -> Option<RunExportRow> {
        Some(RunExportRow {
            created_at: self.created_at,
            entity_type: self.entity_type()?,
            status: self.status(),
            total_records: self.total_records,
            successful_records: self.successful_records,
            failed_records: self.failed_records,
            start_date: self.start_date,
            end_date: self.end_date,
            error_message: self.error_message.clone(),
        })
    }
}

/// DTO for opening a run at phase start.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMigrationRun {
    pub connection_id: DbId,
    pub session_id: Option<DbId>,
    pub entity_type: EntityType,
}

/// Query parameters for run history listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
