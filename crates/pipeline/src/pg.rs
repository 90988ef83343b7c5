//! PostgreSQL target store: the store traits on top of the db repositories.

use async_trait::async_trait;
use cartshift_core::error::CoreError;
use cartshift_core::mapping::{CategoryRecord, GeoIndex, IdentityMap, PartnerRecord, ProductRecord};
use cartshift_core::migration::{EntityType, RunCounters, RunStatus, SessionState};
use cartshift_core::schema_version::DeclaredVersion;
use cartshift_core::types::{DbId, ExternalId};
use cartshift_db::models::migration_run::CreateMigrationRun;
use cartshift_db::models::migration_session::MigrationSession;
use cartshift_db::models::source_connection::SourceConnection;
use cartshift_db::repositories::{
    CategoryRepo, GeoRepo, MigrationRunRepo, MigrationSessionRepo, PartnerRepo, ProductRepo,
    SourceConnectionRepo,
};
use cartshift_source::{MySqlSource, SourceDescriptor};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::session::{run_session, SessionOutcome, SessionPlan};
use crate::store::{NewRun, ReferenceData, RunStore, SessionStore, UpsertRepository};

#[derive(Debug, Clone)]
pub struct PgTargetStore {
    pool: PgPool,
}

impl PgTargetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Upsert repositories
// ---------------------------------------------------------------------------

#[async_trait]
impl UpsertRepository<CategoryRecord> for PgTargetStore {
    async fn find_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> Result<Option<DbId>, StoreError> {
        Ok(CategoryRepo::find_by_external_id(&self.pool, external_id)
            .await?
            .map(|c| c.id))
    }

    async fn insert(&self, record: &CategoryRecord) -> Result<DbId, StoreError> {
        Ok(CategoryRepo::insert(&self.pool, record).await?.id)
    }

    async fn update(&self, id: DbId, record: &CategoryRecord) -> Result<(), StoreError> {
        CategoryRepo::update(&self.pool, id, record)
            .await?
            .map(|_| ())
            .ok_or(StoreError::Missing {
                entity: "ProductCategory",
                id,
            })
    }
}

#[async_trait]
impl UpsertRepository<ProductRecord> for PgTargetStore {
    async fn find_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> Result<Option<DbId>, StoreError> {
        Ok(ProductRepo::find_by_external_id(&self.pool, external_id)
            .await?
            .map(|p| p.id))
    }

    async fn insert(&self, record: &ProductRecord) -> Result<DbId, StoreError> {
        Ok(ProductRepo::insert(&self.pool, record).await?.id)
    }

    async fn update(&self, id: DbId, record: &ProductRecord) -> Result<(), StoreError> {
        ProductRepo::update(&self.pool, id, record)
            .await?
            .map(|_| ())
            .ok_or(StoreError::Missing {
                entity: "Product",
                id,
            })
    }
}

#[async_trait]
impl UpsertRepository<PartnerRecord> for PgTargetStore {
    async fn find_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> Result<Option<DbId>, StoreError> {
        Ok(PartnerRepo::find_by_external_id(&self.pool, external_id)
            .await?
            .map(|p| p.id))
    }

    async fn insert(&self, record: &PartnerRecord) -> Result<DbId, StoreError> {
        Ok(PartnerRepo::insert(&self.pool, record).await?.id)
    }

    async fn update(&self, id: DbId, record: &PartnerRecord) -> Result<(), StoreError> {
        PartnerRepo::update(&self.pool, id, record)
            .await?
            .map(|_| ())
            .ok_or(StoreError::Missing {
                entity: "Partner",
                id,
            })
    }
}

// ---------------------------------------------------------------------------
// Runs and sessions
// ---------------------------------------------------------------------------

#[async_trait]
impl RunStore for PgTargetStore {
    async fn create_run(&self, new: &NewRun) -> Result<DbId, StoreError> {
        let input = CreateMigrationRun {
            connection_id: new.connection_id,
            session_id: new.session_id,
            entity_type: new.entity_type,
        };
        Ok(MigrationRunRepo::create(&self.pool, &input).await?.id)
    }

    async fn save_checkpoint(
        &self,
        run_id: DbId,
        counters: &RunCounters,
        error_log: Option<&str>,
    ) -> Result<(), StoreError> {
        MigrationRunRepo::checkpoint(&self.pool, run_id, counters, error_log).await?;
        MigrationSessionRepo::touch_for_run(&self.pool, run_id).await?;
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
        let finalized =
            MigrationRunRepo::finalize(&self.pool, run_id, status, counters, error_log, details)
                .await?;
        if finalized.is_none() {
            tracing::warn!(run_id, "Run was already terminal; finalize ignored");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgTargetStore {
    async fn update_progress(
        &self,
        session_id: DbId,
        progress: f64,
        current_operation: &str,
    ) -> Result<(), StoreError> {
        MigrationSessionRepo::update_progress(&self.pool, session_id, progress, current_operation)
            .await?;
        Ok(())
    }

    async fn append_log(&self, session_id: DbId, message: &str) -> Result<(), StoreError> {
        MigrationSessionRepo::append_log(&self.pool, session_id, message).await?;
        Ok(())
    }

    async fn set_imported_count(
        &self,
        session_id: DbId,
        entity_type: EntityType,
        count: i32,
    ) -> Result<(), StoreError> {
        MigrationSessionRepo::set_imported_count(&self.pool, session_id, entity_type, count)
            .await?;
        Ok(())
    }

    async fn set_resolved_version(
        &self,
        session_id: DbId,
        version: &str,
    ) -> Result<(), StoreError> {
        MigrationSessionRepo::set_resolved_version(&self.pool, session_id, version).await?;
        Ok(())
    }

    async fn finish_session(
        &self,
        session_id: DbId,
        state: SessionState,
        progress: Option<f64>,
    ) -> Result<(), StoreError> {
        MigrationSessionRepo::finish(&self.pool, session_id, state, progress).await?;
        Ok(())
    }

    async fn mark_connection_synced(&self, connection_id: DbId) -> Result<(), StoreError> {
        SourceConnectionRepo::mark_synced(&self.pool, connection_id).await?;
        Ok(())
    }

    async fn record_detected_version(
        &self,
        connection_id: DbId,
        version: &str,
    ) -> Result<(), StoreError> {
        SourceConnectionRepo::record_detected_version(&self.pool, connection_id, version).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[async_trait]
impl ReferenceData for PgTargetStore {
    async fn category_index(&self) -> Result<IdentityMap, StoreError> {
        Ok(CategoryRepo::external_index(&self.pool)
            .await?
            .into_iter()
            .collect())
    }

    async fn catch_all_category(&self) -> Result<DbId, StoreError> {
        Ok(CategoryRepo::find_or_create_catch_all(&self.pool).await?.id)
    }

    async fn geo_index(&self) -> Result<GeoIndex, StoreError> {
        let mut geo = GeoIndex::new();
        for country in GeoRepo::list_countries(&self.pool).await? {
            geo.add_country(&country.code, country.id);
        }
        for state in GeoRepo::list_states(&self.pool).await? {
            geo.add_state(state.country_id, &state.name, state.id);
        }
        Ok(geo)
    }
}

// ---------------------------------------------------------------------------
// Entry point for claimed sessions
// ---------------------------------------------------------------------------

/// Build a source descriptor from a stored connection.
pub fn descriptor_from_connection(conn: &SourceConnection) -> Result<SourceDescriptor, CoreError> {
    let port = u16::try_from(conn.port)
        .map_err(|_| CoreError::Validation(format!("Invalid port {}", conn.port)))?;
    let declared_version = DeclaredVersion::parse(&conn.schema_version).ok_or_else(|| {
        CoreError::Validation(format!("Invalid schema version '{}'", conn.schema_version))
    })?;

    let mut descriptor = SourceDescriptor::new(
        &conn.host,
        port,
        &conn.database_name,
        &conn.username,
        &conn.password,
    );
    descriptor.declared_version = declared_version;
    Ok(descriptor)
}

/// Run a session the dispatcher claimed, against its stored connection.
pub async fn run_claimed_session(
    pool: &PgPool,
    session: &MigrationSession,
) -> Result<SessionOutcome, StoreError> {
    let store = PgTargetStore::new(pool.clone());
    let plan = SessionPlan::from_session(session);

    let descriptor = match SourceConnectionRepo::find_by_id(pool, session.connection_id).await? {
        Some(conn) => descriptor_from_connection(&conn),
        None => Err(CoreError::NotFound {
            entity: "SourceConnection",
            id: session.connection_id,
        }),
    };

    let descriptor = match descriptor {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(session_id = session.id, error = %e, "Session cannot start");
            MigrationSessionRepo::append_log(pool, session.id, &format!("\nMigration failed:\n{e}\n"))
                .await?;
            MigrationSessionRepo::finish(pool, session.id, SessionState::Failed, None).await?;
            return Ok(SessionOutcome::failed_before_start());
        }
    };

    let source = MySqlSource::new(descriptor);
    run_session(&store, &source, &plan).await
}
