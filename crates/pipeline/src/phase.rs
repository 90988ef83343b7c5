//! One phase: extract every row of an entity type, map it, upsert it.
//!
//! Row-scoped failures are counted in the run and never stop the loop.
//! Failures while preparing the phase (query resolution, extraction,
//! reference data) or while saving a checkpoint end the phase and leave the
//! run `failed`.

use cartshift_core::mapping::{EntityMapper, GeoIndex, IdentityMap, MappedRecord, MappingContext};
use cartshift_core::migration::{is_checkpoint, EntityType, MigrationError, RunCounters, RunStatus};
use cartshift_core::query_registry;
use cartshift_core::row::RawRow;
use cartshift_core::schema_version::SchemaVersion;
use cartshift_core::types::{DbId, ExternalId};
use cartshift_source::RowSource;

use crate::run_log::{self, RunLog};
use crate::store::{NewRun, ReferenceData, RunStore, UpsertRepository};
use crate::upsert::{upsert, UpsertOutcome};

// ---------------------------------------------------------------------------
// Identity arena
// ---------------------------------------------------------------------------

/// `external_id -> id` maps of every phase that ran in a session, one per
/// entity type. Owned by the session and handed to each phase in turn.
#[derive(Debug, Clone, Default)]
pub struct IdentityArena {
    categories: IdentityMap,
    products: IdentityMap,
    customers: IdentityMap,
    suppliers: IdentityMap,
}

impl IdentityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity_type: EntityType) -> &IdentityMap {
        match entity_type {
            EntityType::Category => &self.categories,
            EntityType::Product => &self.products,
            EntityType::Customer => &self.customers,
            EntityType::Supplier => &self.suppliers,
        }
    }

    fn replace(&mut self, entity_type: EntityType, map: IdentityMap) {
        let slot = match entity_type {
            EntityType::Category => &mut self.categories,
            EntityType::Product => &mut self.products,
            EntityType::Customer => &mut self.customers,
            EntityType::Supplier => &mut self.suppliers,
        };
        *slot = map;
    }
}

// ---------------------------------------------------------------------------
// Request / report
// ---------------------------------------------------------------------------

/// Parameters of one phase.
#[derive(Debug, Clone, Copy)]
pub struct PhaseRequest<'a> {
    pub connection_id: DbId,
    pub session_id: Option<DbId>,
    pub entity_type: EntityType,
    pub version: SchemaVersion,
    pub language_code: &'a str,
    /// Rows between checkpoints; at least 1.
    pub batch_size: usize,
    pub update_existing: bool,
}

/// Result of a phase whose row loop ran to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseReport {
    pub run_id: DbId,
    pub entity_type: EntityType,
    pub status: RunStatus,
    pub counters: RunCounters,
}

/// A phase-fatal error. `run_id` is `None` when the run could not be opened.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct PhaseFailure {
    pub entity_type: EntityType,
    pub run_id: Option<DbId>,
    pub error: MigrationError,
}

/// Lookups a mapper sees during the phase.
#[derive(Default)]
struct References {
    categories: IdentityMap,
    catch_all: Option<DbId>,
    geo: GeoIndex,
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Run one phase with mapper `M` and record its outcome in a new run.
pub async fn run_phase<M, S, R>(
    store: &S,
    source: &R,
    arena: &mut IdentityArena,
    request: &PhaseRequest<'_>,
) -> Result<PhaseReport, PhaseFailure>
where
    M: EntityMapper,
    S: RunStore + ReferenceData + UpsertRepository<M::Record> + ?Sized,
    R: RowSource + ?Sized,
{
    let entity_type = request.entity_type;
    let new = NewRun {
        connection_id: request.connection_id,
        session_id: request.session_id,
        entity_type,
    };
    let mut log = run_log::create_run(store, new)
        .await
        .map_err(|e| PhaseFailure {
            entity_type,
            run_id: None,
            error: e.into(),
        })?;

    match execute::<M, S, R>(store, source, arena, request, &mut log).await {
        Ok(()) => {
            let status = run_log::finalize_run(store, &log)
                .await
                .map_err(|e| PhaseFailure {
                    entity_type,
                    run_id: Some(log.run_id),
                    error: e.into(),
                })?;
            Ok(PhaseReport {
                run_id: log.run_id,
                entity_type,
                status,
                counters: log.counters,
            })
        }
        Err(error) => {
            if let Err(e) = run_log::fail_run(store, &mut log, &error).await {
                tracing::error!(run_id = log.run_id, error = %e, "Failed to close failed run");
            }
            Err(PhaseFailure {
                entity_type,
                run_id: Some(log.run_id),
                error,
            })
        }
    }
}

/// Everything between opening and closing the run.
async fn execute<M, S, R>(
    store: &S,
    source: &R,
    arena: &mut IdentityArena,
    request: &PhaseRequest<'_>,
    log: &mut RunLog,
) -> Result<(), MigrationError>
where
    M: EntityMapper,
    S: RunStore + ReferenceData + UpsertRepository<M::Record> + ?Sized,
    R: RowSource + ?Sized,
{
    let entity_type = request.entity_type;
    let spec = query_registry::resolve(request.version, entity_type)?;
    if spec.is_fallback_for(request.version) {
        tracing::debug!(
            requested = %request.version,
            registered = %spec.registered_for,
            entity_type = %entity_type,
            "Using baseline extraction query"
        );
    }

    let refs = load_references(store, arena, entity_type).await?;
    let rows = source.extract(&spec, request.language_code).await?;

    log.counters = RunCounters::with_total(rows.len());
    run_log::checkpoint(store, log).await?;

    // Categories resolve their parents against the rows migrated so far in
    // this phase, so row order decides how deep a tree links up.
    let self_referencing = entity_type == EntityType::Category;
    let mut produced = IdentityMap::new();
    let batch_size = request.batch_size.max(1);

    for (index, row) in rows.iter().enumerate() {
        let result = {
            let categories = if self_referencing { &produced } else { &refs.categories };
            let mut ctx = MappingContext::new(categories, &refs.geo);
            if let Some(id) = refs.catch_all {
                ctx = ctx.with_catch_all(id);
            }
            migrate_row::<M, S>(store, row, &ctx, request.update_existing).await
        };

        match result {
            Ok((external_id, outcome)) => {
                produced.insert(external_id, outcome.target);
                log.counters.record_success();
                tracing::trace!(
                    entity_type = %entity_type,
                    external_id,
                    target = outcome.target,
                    action = %outcome.action,
                    "Record migrated"
                );
            }
            Err(e) => run_log::record_error(log, &e.within_row(M::describe_row(row))),
        }

        if is_checkpoint(index + 1, batch_size) {
            run_log::checkpoint(store, log).await?;
        }
    }

    arena.replace(entity_type, produced);
    Ok(())
}

async fn migrate_row<M, S>(
    store: &S,
    row: &RawRow,
    ctx: &MappingContext<'_>,
    update_existing: bool,
) -> Result<(ExternalId, UpsertOutcome), MigrationError>
where
    M: EntityMapper,
    S: UpsertRepository<M::Record> + ?Sized,
{
    let record = M::map(row, ctx)?;
    let outcome = upsert(store, &record, update_existing)
        .await
        .map_err(|e| MigrationError::record(record.external_id(), e.to_string()))?;
    Ok((record.external_id(), outcome))
}

async fn load_references<S>(
    store: &S,
    arena: &IdentityArena,
    entity_type: EntityType,
) -> Result<References, MigrationError>
where
    S: ReferenceData + ?Sized,
{
    match entity_type {
        EntityType::Category => Ok(References::default()),
        EntityType::Product => {
            // Categories migrated by earlier sessions count as well.
            let mut categories = store.category_index().await?;
            categories.extend(arena.get(EntityType::Category).iter());
            let catch_all = store.catch_all_category().await?;
            Ok(References {
                categories,
                catch_all: Some(catch_all),
                ..References::default()
            })
        }
        EntityType::Customer | EntityType::Supplier => Ok(References {
            geo: store.geo_index().await?,
            ..References::default()
        }),
    }
}
