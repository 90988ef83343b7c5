/// All target-store primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Primary key of an entity in the legacy source system.
pub type ExternalId = i64;
