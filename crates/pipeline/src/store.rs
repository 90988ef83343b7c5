//! Seams between the runner and the target store.

use async_trait::async_trait;
use cartshift_core::mapping::{CategoryRecord, GeoIndex, IdentityMap, PartnerRecord, ProductRecord};
use cartshift_core::migration::{EntityType, RunCounters, RunStatus, SessionState};
use cartshift_core::types::{DbId, ExternalId};

use crate::error::StoreError;

/// Find-or-create access to one target entity table, keyed by external id.
#[async_trait]
pub trait UpsertRepository<R: Sync>: Send + Sync {
    async fn find_by_external_id(&self, external_id: ExternalId)
        -> Result<Option<DbId>, StoreError>;

    /// Create a record, stamping its external id.
    async fn insert(&self, record: &R) -> Result<DbId, StoreError>;

    /// Replace every mapped field of an existing record.
    async fn update(&self, id: DbId, record: &R) -> Result<(), StoreError>;
}

/// Identifies the run to open at phase start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRun {
    pub connection_id: DbId,
    pub session_id: Option<DbId>,
    pub entity_type: EntityType,
}

/// Persistence of migration runs.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Open a run in `in_progress`.
    async fn create_run(&self, new: &NewRun) -> Result<DbId, StoreError>;

    async fn save_checkpoint(
        &self,
        run_id: DbId,
        counters: &RunCounters,
        error_log: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn finalize_run(
        &self,
        run_id: DbId,
        status: RunStatus,
        counters: &RunCounters,
        error_log: Option<&str>,
        details: Option<&str>,
    ) -> Result<(), StoreError>;
}

/// Persistence of the session snapshot polled by callers, plus the
/// connection stamps a session leaves behind.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn update_progress(
        &self,
        session_id: DbId,
        progress: f64,
        current_operation: &str,
    ) -> Result<(), StoreError>;

    async fn append_log(&self, session_id: DbId, message: &str) -> Result<(), StoreError>;

    async fn set_imported_count(
        &self,
        session_id: DbId,
        entity_type: EntityType,
        count: i32,
    ) -> Result<(), StoreError>;

    async fn set_resolved_version(&self, session_id: DbId, version: &str)
        -> Result<(), StoreError>;

    async fn finish_session(
        &self,
        session_id: DbId,
        state: SessionState,
        progress: Option<f64>,
    ) -> Result<(), StoreError>;

    async fn mark_connection_synced(&self, connection_id: DbId) -> Result<(), StoreError>;

    async fn record_detected_version(
        &self,
        connection_id: DbId,
        version: &str,
    ) -> Result<(), StoreError>;
}

/// Lookups prepared before a phase starts.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// Every migrated category, rebuilt from the external id index.
    async fn category_index(&self) -> Result<IdentityMap, StoreError>;

    /// The category unmapped products are linked to, created on demand.
    async fn catch_all_category(&self) -> Result<DbId, StoreError>;

    async fn geo_index(&self) -> Result<GeoIndex, StoreError>;
}

/// Everything a session needs from the target.
pub trait TargetStore:
    RunStore
    + SessionStore
    + ReferenceData
    + UpsertRepository<CategoryRecord>
    + UpsertRepository<ProductRecord>
    + UpsertRepository<PartnerRecord>
{
}

impl<T> TargetStore for T where
    T: RunStore
        + SessionStore
        + ReferenceData
        + UpsertRepository<CategoryRecord>
        + UpsertRepository<ProductRecord>
        + UpsertRepository<PartnerRecord>
{
}
