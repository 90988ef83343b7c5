//! Run and session vocabulary for the migration engine.
//!
//! This module has zero external dependencies (no DB, no async, no I/O).
//! It provides:
//!
//! - Entity type, run status, session state and entity action enums with
//!   string conversions matching the persisted values
//! - The migration error taxonomy and its fatal/recoverable classification
//! - Run counters and terminal status derivation
//! - Batch size bounds, progress and duration helpers

use serde::{Deserialize, Serialize};

use crate::schema_version::SchemaVersion;
use crate::types::ExternalId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smallest accepted checkpoint cadence.
pub const MIN_BATCH_SIZE: i32 = 1;

/// Largest accepted checkpoint cadence.
pub const MAX_BATCH_SIZE: i32 = 1000;

/// Checkpoint cadence used when the trigger does not specify one.
pub const DEFAULT_BATCH_SIZE: i32 = 100;

/// Language used for description-table joins when none is configured.
pub const DEFAULT_LANGUAGE_CODE: &str = "tr";

/// Separator placed between entries of a run's cumulative error log.
pub const ERROR_LOG_SEPARATOR: &str = "\n---\n";

// ---------------------------------------------------------------------------
// Entity Type
// ---------------------------------------------------------------------------

/// The kind of entity migrated by one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Category,
    Product,
    Customer,
    Supplier,
}

impl EntityType {
    /// Phases in dependency order. Products read the category mapping, so
    /// categories must always run first.
    pub const ORDERED: [EntityType; 4] = [
        EntityType::Category,
        EntityType::Product,
        EntityType::Customer,
        EntityType::Supplier,
    ];

    /// Return the entity type name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Product => "product",
            Self::Customer => "customer",
            Self::Supplier => "supplier",
        }
    }

    /// Parse an entity type string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "category" => Some(Self::Category),
            "product" => Some(Self::Product),
            "customer" => Some(Self::Customer),
            "supplier" => Some(Self::Supplier),
            _ => None,
        }
    }

    /// Human label used in exports and status screens.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Category => "Categories",
            Self::Product => "Products",
            Self::Customer => "Customers",
            Self::Supplier => "Suppliers",
        }
    }

    /// Lower-case plural used in log sentences ("Imported 4 categories").
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::Product => "products",
            Self::Customer => "customers",
            Self::Supplier => "suppliers",
        }
    }

    /// Whether this phase only exists on the multi-vendor schema variant.
    pub fn requires_multi_vendor(&self) -> bool {
        matches!(self, Self::Supplier)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Run Status
// ---------------------------------------------------------------------------

/// Status of a single-entity migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Draft,
    InProgress,
    Completed,
    Failed,
    Partial,
}

impl RunStatus {
    /// Return the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Partial => "partial",
        }
    }

    /// Parse a status string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }

    /// Human label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Partial => "Partial Success",
        }
    }

    /// Terminal runs are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Partial)
    }

    /// All valid status values.
    pub const ALL: &'static [&'static str] =
        &["draft", "in_progress", "completed", "failed", "partial"];
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Session State
// ---------------------------------------------------------------------------

/// State of an orchestration pass over several entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Draft,
    InProgress,
    Completed,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entity Action
// ---------------------------------------------------------------------------

/// What an upsert did to the target store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityAction {
    Created,
    Updated,
    Skipped,
}

impl EntityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for EntityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Remediation checklist appended to connectivity failures.
pub const CONNECTIVITY_CHECKLIST: &str = "Please check:\n\
    1. Host and port are correct\n\
    2. Database name is correct\n\
    3. Username and password are correct\n\
    4. The database server is running\n\
    5. Remote connections are allowed (if applicable)";

/// Failure taxonomy of the migration engine.
///
/// `Record` failures are recovered at row scope; everything else ends the
/// current phase.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MigrationError {
    #[error("Cannot connect to source database: {cause}")]
    Connectivity { cause: String },

    #[error("Unsupported combination: no {entity_type} extraction query for schema version {version}")]
    QueryResolution {
        version: SchemaVersion,
        entity_type: EntityType,
    },

    #[error("Record ID: {external_id}\nError: {message}")]
    Record { external_id: String, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl MigrationError {
    /// Build a record-scoped error for a row identified by `external_id`.
    pub fn record(external_id: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Record {
            external_id: external_id.to_string(),
            message: message.into(),
        }
    }

    /// Whether the error aborts the current phase.
    pub fn is_phase_fatal(&self) -> bool {
        !matches!(self, Self::Record { .. })
    }

    /// Reclassify an error raised inside the row loop as record-scoped.
    ///
    /// Unexpected errors inside the loop never escalate.
    pub fn within_row(self, external_id: impl std::fmt::Display) -> Self {
        match self {
            Self::Record { .. } => self,
            other => Self::record(external_id, other.to_string()),
        }
    }

    /// Message stored in a failed run's error log.
    pub fn run_log_message(&self) -> String {
        match self {
            Self::Connectivity { .. } | Self::QueryResolution { .. } => {
                format!("Database error: {self}")
            }
            Self::Record { .. } => self.to_string(),
            Self::Unexpected(msg) => format!("Unexpected error: {msg}"),
        }
    }

    /// Message surfaced to the person who triggered the migration.
    pub fn user_message(&self, entity_type: EntityType) -> String {
        let base = format!("{} migration failed: {self}", capitalize(entity_type.as_str()));
        match self {
            Self::Connectivity { .. } => format!("{base}\n\n{CONNECTIVITY_CHECKLIST}"),
            _ => base,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Counters and status derivation
// ---------------------------------------------------------------------------

/// Counters of a phase in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub total: i32,
    pub processed: i32,
    pub successful: i32,
    pub failed: i32,
}

impl RunCounters {
    /// Counters for a freshly extracted row set.
    pub fn with_total(total: usize) -> Self {
        Self {
            total: i32::try_from(total).unwrap_or(i32::MAX),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
        self.processed += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
        self.processed += 1;
    }

    /// `total == successful + failed`; holds once every row was processed.
    pub fn is_balanced(&self) -> bool {
        self.total == self.successful + self.failed
    }

    /// Terminal status once the row loop finished without a fatal error.
    ///
    /// A run where every row failed is still `partial`: only phase-fatal
    /// errors produce `failed`.
    pub fn finished_status(&self) -> RunStatus {
        if self.failed == 0 {
            RunStatus::Completed
        } else {
            RunStatus::Partial
        }
    }
}

/// Append one entry to a cumulative error log.
pub fn append_error_entry(log: &mut String, entry: &str) {
    if !log.is_empty() {
        log.push_str(ERROR_LOG_SEPARATOR);
    }
    log.push_str(entry);
}

// ---------------------------------------------------------------------------
// Batch size, progress, duration
// ---------------------------------------------------------------------------

/// Validate a checkpoint cadence.
pub fn validate_batch_size(batch_size: i32) -> Result<(), String> {
    if batch_size < MIN_BATCH_SIZE {
        return Err(format!("Batch size must be at least {MIN_BATCH_SIZE}"));
    }
    if batch_size > MAX_BATCH_SIZE {
        return Err(format!("Batch size cannot exceed {MAX_BATCH_SIZE}"));
    }
    Ok(())
}

/// Whether the row with 1-based index `processed` closes a batch.
pub fn is_checkpoint(processed: usize, batch_size: usize) -> bool {
    batch_size > 0 && processed % batch_size == 0
}

/// Percentage of finished phases, in `0.0..=100.0`.
pub fn progress_percent(completed_phases: usize, total_phases: usize) -> f64 {
    if total_phases == 0 {
        return 0.0;
    }
    (completed_phases as f64 / total_phases as f64 * 100.0).clamp(0.0, 100.0)
}

/// Render a duration for humans: seconds below a minute, minutes below an
/// hour, hours above.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1} seconds")
    } else if seconds < 3600.0 {
        format!("{:.1} minutes", seconds / 60.0)
    } else {
        format!("{:.1} hours", seconds / 3600.0)
    }
}

/// Display identifier for a row whose external id could not be read.
pub fn describe_external_id(id: Option<ExternalId>) -> String {
    id.map_or_else(|| "unknown".to_string(), |id| id.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
