//! Session orchestration: resolve the schema dialect once, then run the
//! selected phases in dependency order, keeping the polled snapshot
//! current at every phase boundary.

use cartshift_core::mapping::{CategoryMapper, CustomerMapper, ProductMapper, SupplierMapper};
use cartshift_core::migration::{
    progress_percent, EntityType, MigrationError, SessionState, MAX_BATCH_SIZE, MIN_BATCH_SIZE,
};
use cartshift_core::schema_version::SchemaVersion;
use cartshift_core::types::DbId;
use cartshift_db::models::migration_session::MigrationSession;
use cartshift_source::{RowSource, VersionSource};

use crate::error::StoreError;
use crate::phase::{run_phase, IdentityArena, PhaseFailure, PhaseReport, PhaseRequest};
use crate::run_log;
use crate::store::{NewRun, TargetStore};

/// What one session is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub session_id: DbId,
    pub connection_id: DbId,
    pub entity_types: Vec<EntityType>,
    pub update_existing: bool,
    pub batch_size: i32,
    pub language_code: String,
}

impl SessionPlan {
    pub fn from_session(session: &MigrationSession) -> Self {
        Self {
            session_id: session.id,
            connection_id: session.connection_id,
            entity_types: session.enabled_entity_types(),
            update_existing: session.update_existing,
            batch_size: session.batch_size,
            language_code: session.language_code.clone(),
        }
    }

    /// Selected entity types in dependency order, without duplicates.
    fn ordered_entity_types(&self) -> Vec<EntityType> {
        EntityType::ORDERED
            .into_iter()
            .filter(|t| self.entity_types.contains(t))
            .collect()
    }

    fn checkpoint_every(&self) -> usize {
        self.batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE) as usize
    }
}

/// How a session ended.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub state: SessionState,
    pub version: Option<SchemaVersion>,
    pub phases: Vec<PhaseReport>,
    /// Phases left out because the dialect does not support them.
    pub skipped: Vec<EntityType>,
    pub failure: Option<PhaseFailure>,
}

impl SessionOutcome {
    /// A session that ended before its source could be contacted.
    pub fn failed_before_start() -> Self {
        Self {
            state: SessionState::Failed,
            version: None,
            phases: Vec::new(),
            skipped: Vec::new(),
            failure: None,
        }
    }

    /// Rows imported by the phase of `entity_type`, zero when it did not run.
    pub fn imported(&self, entity_type: EntityType) -> i32 {
        self.phases
            .iter()
            .find(|p| p.entity_type == entity_type)
            .map_or(0, |p| p.counters.successful)
    }
}

/// Run a session that was already moved to `in_progress`.
///
/// Errors of the migration itself end up in the outcome and the session
/// log; `Err` means the snapshot could not be written.
pub async fn run_session<S, R>(
    store: &S,
    source: &R,
    plan: &SessionPlan,
) -> Result<SessionOutcome, StoreError>
where
    S: TargetStore + ?Sized,
    R: RowSource + VersionSource + ?Sized,
{
    let selected = plan.ordered_entity_types();
    let mut outcome = SessionOutcome {
        state: SessionState::InProgress,
        version: None,
        phases: Vec::new(),
        skipped: Vec::new(),
        failure: None,
    };

    let resolved = match source.resolve_version().await {
        Ok(resolved) => resolved,
        Err(e) => {
            let error = MigrationError::from(e);
            tracing::error!(session_id = plan.session_id, error = %error, "Schema version resolution failed");
            // The first phase owns the failure so the run history records it.
            let (entity_type, run_id) = match selected.first().copied() {
                Some(entity_type) => {
                    let run_id = record_failed_run(store, plan, entity_type, &error).await?;
                    (entity_type, Some(run_id))
                }
                None => (EntityType::Category, None),
            };
            let failure = PhaseFailure {
                entity_type,
                run_id,
                error,
            };
            return fail(store, plan, outcome, failure).await;
        }
    };
    let version = resolved.version;
    outcome.version = Some(version);
    if resolved.detected {
        store
            .record_detected_version(plan.connection_id, version.as_str())
            .await?;
    }
    store
        .set_resolved_version(plan.session_id, version.as_str())
        .await?;
    tracing::info!(
        session_id = plan.session_id,
        %version,
        detected = resolved.detected,
        "Session started"
    );

    let (phases, skipped): (Vec<_>, Vec<_>) = selected
        .into_iter()
        .partition(|t| !t.requires_multi_vendor() || version.is_multi_vendor());
    for entity_type in &skipped {
        store
            .append_log(
                plan.session_id,
                &format!(
                    "Skipped {}: schema version {version} has no multi-vendor tables\n",
                    entity_type.plural()
                ),
            )
            .await?;
        tracing::info!(session_id = plan.session_id, entity_type = %entity_type, %version, "Phase skipped");
    }
    outcome.skipped = skipped;

    let mut arena = IdentityArena::new();
    let total = phases.len();
    for (index, entity_type) in phases.iter().copied().enumerate() {
        store
            .update_progress(
                plan.session_id,
                progress_percent(index, total),
                &format!("Importing {}...", entity_type.plural()),
            )
            .await?;

        let request = PhaseRequest {
            connection_id: plan.connection_id,
            session_id: Some(plan.session_id),
            entity_type,
            version,
            language_code: &plan.language_code,
            batch_size: plan.checkpoint_every(),
            update_existing: plan.update_existing,
        };
        let result = match entity_type {
            EntityType::Category => {
                run_phase::<CategoryMapper, _, _>(store, source, &mut arena, &request).await
            }
            EntityType::Product => {
                run_phase::<ProductMapper, _, _>(store, source, &mut arena, &request).await
            }
            EntityType::Customer => {
                run_phase::<CustomerMapper, _, _>(store, source, &mut arena, &request).await
            }
            EntityType::Supplier => {
                run_phase::<SupplierMapper, _, _>(store, source, &mut arena, &request).await
            }
        };

        match result {
            Ok(report) => {
                let imported = report.counters.successful;
                store
                    .append_log(
                        plan.session_id,
                        &format!("Imported {imported} {}\n", entity_type.plural()),
                    )
                    .await?;
                store
                    .set_imported_count(plan.session_id, entity_type, imported)
                    .await?;
                store.mark_connection_synced(plan.connection_id).await?;
                outcome.phases.push(report);
            }
            Err(failure) => return fail(store, plan, outcome, failure).await,
        }
    }

    store
        .append_log(plan.session_id, &completion_summary(&outcome, version))
        .await?;
    store
        .finish_session(plan.session_id, SessionState::Completed, Some(100.0))
        .await?;
    tracing::info!(
        session_id = plan.session_id,
        phases = outcome.phases.len(),
        skipped = outcome.skipped.len(),
        "Session completed"
    );
    outcome.state = SessionState::Completed;
    Ok(outcome)
}

/// Open a run for a phase that cannot start and close it as `failed`.
async fn record_failed_run<S: TargetStore + ?Sized>(
    store: &S,
    plan: &SessionPlan,
    entity_type: EntityType,
    error: &MigrationError,
) -> Result<DbId, StoreError> {
    let new = NewRun {
        connection_id: plan.connection_id,
        session_id: Some(plan.session_id),
        entity_type,
    };
    let mut log = run_log::create_run(store, new).await?;
    run_log::fail_run(store, &mut log, error).await?;
    Ok(log.run_id)
}

async fn fail<S: TargetStore + ?Sized>(
    store: &S,
    plan: &SessionPlan,
    mut outcome: SessionOutcome,
    failure: PhaseFailure,
) -> Result<SessionOutcome, StoreError> {
    let message = failure.error.user_message(failure.entity_type);
    store
        .append_log(plan.session_id, &format!("\nMigration failed:\n{message}\n"))
        .await?;
    store
        .finish_session(plan.session_id, SessionState::Failed, None)
        .await?;
    tracing::error!(
        session_id = plan.session_id,
        entity_type = %failure.entity_type,
        error = %failure.error,
        "Session failed"
    );
    outcome.state = SessionState::Failed;
    outcome.failure = Some(failure);
    Ok(outcome)
}

fn completion_summary(outcome: &SessionOutcome, version: SchemaVersion) -> String {
    let mut summary = String::from("\nMigration completed successfully!\nTotal imported:\n");
    for entity_type in EntityType::ORDERED {
        if entity_type.requires_multi_vendor() && !version.is_multi_vendor() {
            continue;
        }
        summary.push_str(&format!(
            "- {}: {}\n",
            entity_type.label(),
            outcome.imported(entity_type)
        ));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(types: Vec<EntityType>, batch_size: i32) -> SessionPlan {
        SessionPlan {
            session_id: 1,
            connection_id: 1,
            entity_types: types,
            update_existing: true,
            batch_size,
            language_code: "tr".into(),
        }
    }

    #[test]
    fn phases_follow_dependency_order() {
        let p = plan(
            vec![EntityType::Customer, EntityType::Category, EntityType::Product, EntityType::Category],
            100,
        );
        assert_eq!(
            p.ordered_entity_types(),
            vec![EntityType::Category, EntityType::Product, EntityType::Customer]
        );
    }

    #[test]
    fn checkpoint_cadence_is_bounded() {
        assert_eq!(plan(vec![], 0).checkpoint_every(), 1);
        assert_eq!(plan(vec![], 5000).checkpoint_every(), 1000);
        assert_eq!(plan(vec![], 250).checkpoint_every(), 250);
    }

    #[test]
    fn summary_lists_suppliers_only_for_multi_vendor() {
        let outcome = SessionOutcome {
            state: SessionState::Completed,
            version: None,
            phases: Vec::new(),
            skipped: Vec::new(),
            failure: None,
        };
        let plain = completion_summary(&outcome, SchemaVersion::V4_10);
        assert!(plain.contains("- Categories: 0\n- Products: 0\n- Customers: 0\n"));
        assert!(!plain.contains("Suppliers"));

        let mve = completion_summary(&outcome, SchemaVersion::Mve);
        assert!(mve.ends_with("- Suppliers: 0\n"));
    }
}
