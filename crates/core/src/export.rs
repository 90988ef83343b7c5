//! Flat CSV rendering of migration run history.

use crate::error::CoreError;
use crate::migration::{EntityType, RunStatus};
use crate::types::Timestamp;

/// Fixed header of the export.
pub const EXPORT_HEADER: [&str; 8] = [
    "Date",
    "Migration Type",
    "Status",
    "Total Records",
    "Successful",
    "Failed",
    "Duration (s)",
    "Error Message",
];

/// File name offered to downloading clients.
pub const EXPORT_FILE_NAME: &str = "migration_logs.csv";

/// One run as it appears in the export.
#[derive(Debug, Clone)]
pub struct RunExportRow {
    pub created_at: Timestamp,
    pub entity_type: EntityType,
    pub status: RunStatus,
    pub total_records: i32,
    pub successful_records: i32,
    pub failed_records: i32,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub error_message: Option<String>,
}

impl RunExportRow {
    /// Wall-clock duration, zero until the run has both timestamps.
    pub fn duration_seconds(&self) -> f64 {
        duration_seconds(self.start_date, self.end_date)
    }
}

/// Seconds between two optional timestamps; zero when either is missing.
pub fn duration_seconds(start: Option<Timestamp>, end: Option<Timestamp>) -> f64 {
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    }
}

/// Render rows (already in display order) as CSV with [`EXPORT_HEADER`].
pub fn render_runs_csv(rows: &[RunExportRow]) -> Result<String, CoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER).map_err(csv_error)?;

    for row in rows {
        writer
            .write_record([
                row.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                row.entity_type.label().to_string(),
                row.status.label().to_string(),
                row.total_records.to_string(),
                row.successful_records.to_string(),
                row.failed_records.to_string(),
                format!("{:.2}", row.duration_seconds()),
                row.error_message.clone().unwrap_or_default(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal(format!("CSV is not UTF-8: {e}")))
}

fn csv_error(e: csv::Error) -> CoreError {
    CoreError::Internal(format!("CSV write failed: {e}"))
}
