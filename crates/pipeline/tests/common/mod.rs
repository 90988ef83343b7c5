//! In-memory target store and row source for pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cartshift_core::mapping::{
    CategoryRecord, GeoIndex, IdentityMap, MappedRecord, PartnerRecord, ProductRecord,
};
use cartshift_core::migration::{EntityType, RunCounters, RunStatus, SessionState};
use cartshift_core::query_registry::QuerySpec;
use cartshift_core::row::RawRow;
use cartshift_core::schema_version::SchemaVersion;
use cartshift_core::types::{DbId, ExternalId};
use cartshift_pipeline::store::{NewRun, ReferenceData, RunStore, SessionStore, UpsertRepository};
use cartshift_pipeline::{SessionPlan, StoreError};
use cartshift_source::{ResolvedVersion, RowSource, SourceError, VersionSource};

pub const SESSION_ID: DbId = 1;
pub const CONNECTION_ID: DbId = 1;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A stored run as the store last saw it.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub id: DbId,
    pub entity_type: EntityType,
    pub session_id: Option<DbId>,
    pub status: RunStatus,
    pub counters: RunCounters,
    pub error_log: Option<String>,
    pub details: Option<String>,
    pub checkpoints: usize,
}

#[derive(Debug, Default)]
pub struct SessionSnapshot {
    pub state: Option<SessionState>,
    pub progress: Vec<f64>,
    pub operations: Vec<String>,
    pub log: String,
    pub imported: HashMap<EntityType, i32>,
    pub resolved_version: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    next_id: DbId,
    categories: Vec<(DbId, CategoryRecord)>,
    products: Vec<(DbId, ProductRecord)>,
    partners: Vec<(DbId, PartnerRecord)>,
    catch_all: Option<DbId>,
    runs: Vec<StoredRun>,
    session: SessionSnapshot,
    detected_version: Option<String>,
    synced: usize,
    writes: usize,
}

impl State {
    fn allocate(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    geo: GeoIndex,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geo(geo: GeoIndex) -> Self {
        Self {
            geo,
            ..Self::default()
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn categories(&self) -> Vec<(DbId, CategoryRecord)> {
        self.lock().categories.clone()
    }

    pub fn products(&self) -> Vec<(DbId, ProductRecord)> {
        self.lock().products.clone()
    }

    pub fn partners(&self) -> Vec<(DbId, PartnerRecord)> {
        self.lock().partners.clone()
    }

    pub fn category_id(&self, external_id: ExternalId) -> Option<DbId> {
        self.lock()
            .categories
            .iter()
            .find(|(_, c)| c.external_id == external_id)
            .map(|(id, _)| *id)
    }

    pub fn category(&self, external_id: ExternalId) -> Option<CategoryRecord> {
        self.lock()
            .categories
            .iter()
            .find(|(_, c)| c.external_id == external_id)
            .map(|(_, c)| c.clone())
    }

    pub fn catch_all(&self) -> Option<DbId> {
        self.lock().catch_all
    }

    pub fn runs(&self) -> Vec<StoredRun> {
        self.lock().runs.clone()
    }

    pub fn run(&self, entity_type: EntityType) -> Option<StoredRun> {
        self.lock()
            .runs
            .iter()
            .rev()
            .find(|r| r.entity_type == entity_type)
            .cloned()
    }

    pub fn session_log(&self) -> String {
        self.lock().session.log.clone()
    }

    pub fn session_state(&self) -> Option<SessionState> {
        self.lock().session.state
    }

    pub fn progress_history(&self) -> Vec<f64> {
        self.lock().session.progress.clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.lock().session.operations.clone()
    }

    pub fn imported(&self, entity_type: EntityType) -> i32 {
        self.lock()
            .session
            .imported
            .get(&entity_type)
            .copied()
            .unwrap_or(0)
    }

    pub fn resolved_version(&self) -> Option<String> {
        self.lock().session.resolved_version.clone()
    }

    pub fn detected_version(&self) -> Option<String> {
        self.lock().detected_version.clone()
    }

    pub fn synced(&self) -> usize {
        self.lock().synced
    }

    /// Inserts and updates performed on entity tables.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }
}

fn upsert_find<R: MappedRecord>(rows: &[(DbId, R)], external_id: ExternalId) -> Option<DbId> {
    rows.iter()
        .find(|(_, r)| r.external_id() == external_id)
        .map(|(id, _)| *id)
}

fn upsert_replace<R: Clone>(
    rows: &mut [(DbId, R)],
    id: DbId,
    record: &R,
    entity: &'static str,
) -> Result<(), StoreError> {
    let slot = rows
        .iter_mut()
        .find(|(row_id, _)| *row_id == id)
        .ok_or(StoreError::Missing { entity, id })?;
    slot.1 = record.clone();
    Ok(())
}

#[async_trait]
impl UpsertRepository<CategoryRecord> for MemoryStore {
    async fn find_by_external_id(&self, external_id: ExternalId) -> Result<Option<DbId>, StoreError> {
        Ok(upsert_find(&self.lock().categories, external_id))
    }

    async fn insert(&self, record: &CategoryRecord) -> Result<DbId, StoreError> {
        let mut state = self.lock();
        let id = state.allocate();
        state.categories.push((id, record.clone()));
        state.writes += 1;
        Ok(id)
    }

    async fn update(&self, id: DbId, record: &CategoryRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.writes += 1;
        upsert_replace(&mut state.categories, id, record, "ProductCategory")
    }
}

#[async_trait]
impl UpsertRepository<ProductRecord> for MemoryStore {
    async fn find_by_external_id(&self, external_id: ExternalId) -> Result<Option<DbId>, StoreError> {
        Ok(upsert_find(&self.lock().products, external_id))
    }

    async fn insert(&self, record: &ProductRecord) -> Result<DbId, StoreError> {
        let mut state = self.lock();
        let id = state.allocate();
        state.products.push((id, record.clone()));
        state.writes += 1;
        Ok(id)
    }

    async fn update(&self, id: DbId, record: &ProductRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.writes += 1;
        upsert_replace(&mut state.products, id, record, "Product")
    }
}

#[async_trait]
impl UpsertRepository<PartnerRecord> for MemoryStore {
    async fn find_by_external_id(&self, external_id: ExternalId) -> Result<Option<DbId>, StoreError> {
        Ok(upsert_find(&self.lock().partners, external_id))
    }

    async fn insert(&self, record: &PartnerRecord) -> Result<DbId, StoreError> {
        let mut state = self.lock();
        let id = state.allocate();
        state.partners.push((id, record.clone()));
        state.writes += 1;
        Ok(id)
    }

    async fn update(&self, id: DbId, record: &PartnerRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.writes += 1;
        upsert_replace(&mut state.partners, id, record, "Partner")
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn create_run(&self, new: &NewRun) -> Result<DbId, StoreError> {
        let mut state = self.lock();
        let id = state.allocate();
        state.runs.push(StoredRun {
            id,
            entity_type: new.entity_type,
            session_id: new.session_id,
            status: RunStatus::InProgress,
            counters: RunCounters::default(),
            error_log: None,
            details: None,
            checkpoints: 0,
        });
        Ok(id)
    }

    async fn save_checkpoint(
        &self,
        run_id: DbId,
        counters: &RunCounters,
        error_log: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == run_id && r.status == RunStatus::InProgress)
            .ok_or(StoreError::Missing { entity: "MigrationRun", id: run_id })?;
        run.counters = *counters;
        run.error_log = error_log.map(str::to_string);
        run.checkpoints += 1;
        Ok(())
    }

    async fn finalize_run(
        &self,
        run_id: DbId,
        status: RunStatus,
        counters: &RunCounters,
        error_log: Option<&str>,
        details: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(run) = state
            .runs
            .iter_mut()
            .find(|r| r.id == run_id && r.status == RunStatus::InProgress)
        {
            run.status = status;
            run.counters = *counters;
            run.error_log = error_log.map(str::to_string);
            run.details = details.map(str::to_string);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn update_progress(
        &self,
        _session_id: DbId,
        progress: f64,
        current_operation: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.session.progress.push(progress);
        state.session.operations.push(current_operation.to_string());
        Ok(())
    }

    async fn append_log(&self, _session_id: DbId, message: &str) -> Result<(), StoreError> {
        self.lock().session.log.push_str(message);
        Ok(())
    }

    async fn set_imported_count(
        &self,
        _session_id: DbId,
        entity_type: EntityType,
        count: i32,
    ) -> Result<(), StoreError> {
        self.lock().session.imported.insert(entity_type, count);
        Ok(())
    }

    async fn set_resolved_version(&self, _session_id: DbId, version: &str) -> Result<(), StoreError> {
        self.lock().session.resolved_version = Some(version.to_string());
        Ok(())
    }

    async fn finish_session(
        &self,
        _session_id: DbId,
        state: SessionState,
        progress: Option<f64>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.session.state = Some(state);
        if let Some(p) = progress {
            inner.session.progress.push(p);
        }
        Ok(())
    }

    async fn mark_connection_synced(&self, _connection_id: DbId) -> Result<(), StoreError> {
        self.lock().synced += 1;
        Ok(())
    }

    async fn record_detected_version(
        &self,
        _connection_id: DbId,
        version: &str,
    ) -> Result<(), StoreError> {
        self.lock().detected_version = Some(version.to_string());
        Ok(())
    }
}

#[async_trait]
impl ReferenceData for MemoryStore {
    async fn category_index(&self) -> Result<IdentityMap, StoreError> {
        Ok(self
            .lock()
            .categories
            .iter()
            .map(|(id, c)| (c.external_id, *id))
            .collect())
    }

    async fn catch_all_category(&self) -> Result<DbId, StoreError> {
        let mut state = self.lock();
        if let Some(id) = state.catch_all {
            return Ok(id);
        }
        let id = state.allocate();
        state.catch_all = Some(id);
        Ok(id)
    }

    async fn geo_index(&self) -> Result<GeoIndex, StoreError> {
        Ok(self.geo.clone())
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Legacy database stand-in. Rows are served by entity type, recognised
/// from the registered SQL.
#[derive(Debug)]
pub struct MemorySource {
    /// `None` makes version resolution fail like an unreachable host.
    pub version: Option<ResolvedVersion>,
    pub rows: HashMap<EntityType, Vec<RawRow>>,
    /// Entity types whose extraction fails with a query error.
    pub broken: Vec<EntityType>,
    extracted: Mutex<Vec<(EntityType, QuerySpec, String)>>,
}

impl MemorySource {
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version: Some(ResolvedVersion {
                version,
                detected: false,
            }),
            rows: HashMap::new(),
            broken: Vec::new(),
            extracted: Mutex::new(Vec::new()),
        }
    }

    pub fn detected(version: SchemaVersion) -> Self {
        let mut source = Self::new(version);
        source.version = Some(ResolvedVersion {
            version,
            detected: true,
        });
        source
    }

    pub fn unreachable() -> Self {
        let mut source = Self::new(SchemaVersion::BASELINE);
        source.version = None;
        source
    }

    pub fn with_rows(mut self, entity_type: EntityType, rows: Vec<RawRow>) -> Self {
        self.rows.insert(entity_type, rows);
        self
    }

    pub fn breaking(mut self, entity_type: EntityType) -> Self {
        self.broken.push(entity_type);
        self
    }

    /// Every extraction performed: entity type, query and language code.
    pub fn extractions(&self) -> Vec<(EntityType, QuerySpec, String)> {
        self.extracted.lock().unwrap().clone()
    }
}

fn entity_of(sql: &str) -> EntityType {
    if sql.contains("user_type = 'V'") {
        EntityType::Supplier
    } else if sql.contains("user_type = 'C'") {
        EntityType::Customer
    } else if sql.contains("FROM cscart_categories") {
        EntityType::Category
    } else {
        EntityType::Product
    }
}

#[async_trait]
impl RowSource for MemorySource {
    async fn extract(&self, spec: &QuerySpec, language_code: &str) -> Result<Vec<RawRow>, SourceError> {
        let entity_type = entity_of(spec.sql);
        self.extracted
            .lock()
            .unwrap()
            .push((entity_type, *spec, language_code.to_string()));
        if self.broken.contains(&entity_type) {
            return Err(SourceError::Query(sqlx::Error::Protocol(format!(
                "Table '{}' doesn't exist",
                entity_type.plural()
            ))));
        }
        Ok(self.rows.get(&entity_type).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl VersionSource for MemorySource {
    async fn resolve_version(&self) -> Result<ResolvedVersion, SourceError> {
        self.version
            .ok_or_else(|| SourceError::Connect("Can't connect to MySQL server on 'shop.invalid'".into()))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn plan(entity_types: &[EntityType], batch_size: i32, update_existing: bool) -> SessionPlan {
    SessionPlan {
        session_id: SESSION_ID,
        connection_id: CONNECTION_ID,
        entity_types: entity_types.to_vec(),
        update_existing,
        batch_size,
        language_code: "tr".to_string(),
    }
}

pub fn category(id: i64, parent: i64, name: &str) -> RawRow {
    RawRow::new()
        .with("category_id", id)
        .with("parent_id", parent)
        .with("category", name)
        .with("status", "A")
}

pub fn product(id: i64, category_id: i64, name: &str) -> RawRow {
    RawRow::new()
        .with("product_id", id)
        .with("product_code", format!("SKU-{id}"))
        .with("product", name)
        .with("status", "A")
        .with("list_price", "10.00")
        .with("price", "6.50")
        .with("category_id", category_id)
}

pub fn customer(id: i64, first: &str, last: &str) -> RawRow {
    RawRow::new()
        .with("user_id", id)
        .with("firstname", first)
        .with("lastname", last)
        .with("email", format!("{}@example.com", first.to_lowercase()))
        .with("country", "TR")
        .with("state", "Istanbul")
        .with("status", "A")
}

pub fn supplier(id: i64, vendor: &str) -> RawRow {
    RawRow::new()
        .with("user_id", id)
        .with("vendor_name", vendor)
        .with("status", "A")
}

pub fn geo() -> GeoIndex {
    let mut geo = GeoIndex::new();
    geo.add_country("TR", 900);
    geo.add_state(900, "Istanbul", 901);
    geo
}
