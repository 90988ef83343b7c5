//! Run bookkeeping shared by every phase.
//!
//! A [`RunLog`] is the in-memory mirror of one `migration_runs` row. Only
//! the phase that opened it writes to it; the store sees it at checkpoints
//! and once more when it is finalized.

use cartshift_core::migration::{append_error_entry, EntityType, MigrationError, RunCounters, RunStatus};
use cartshift_core::types::DbId;

use crate::error::StoreError;
use crate::store::{NewRun, RunStore};

#[derive(Debug, Clone)]
pub struct RunLog {
    pub run_id: DbId,
    pub entity_type: EntityType,
    pub counters: RunCounters,
    pub error_log: String,
}

impl RunLog {
    fn error_log(&self) -> Option<&str> {
        (!self.error_log.is_empty()).then_some(self.error_log.as_str())
    }
}

/// Open a run in `in_progress` for one phase.
pub async fn create_run<S: RunStore + ?Sized>(store: &S, new: NewRun) -> Result<RunLog, StoreError> {
    let run_id = store.create_run(&new).await?;
    tracing::info!(run_id, entity_type = %new.entity_type, "Migration run started");
    Ok(RunLog {
        run_id,
        entity_type: new.entity_type,
        counters: RunCounters::default(),
        error_log: String::new(),
    })
}

/// Persist the counters and error log accumulated so far.
pub async fn checkpoint<S: RunStore + ?Sized>(store: &S, log: &RunLog) -> Result<(), StoreError> {
    store
        .save_checkpoint(log.run_id, &log.counters, log.error_log())
        .await?;
    tracing::debug!(
        run_id = log.run_id,
        processed = log.counters.processed,
        total = log.counters.total,
        "Checkpoint saved"
    );
    Ok(())
}

/// Count a failed row and append its record-identified message.
pub fn record_error(log: &mut RunLog, error: &MigrationError) {
    log.counters.record_failure();
    append_error_entry(&mut log.error_log, &error.to_string());
    tracing::warn!(
        run_id = log.run_id,
        entity_type = %log.entity_type,
        error = %error,
        "Record migration failed"
    );
}

/// Close the run with the status derived from its counters.
pub async fn finalize_run<S: RunStore + ?Sized>(
    store: &S,
    log: &RunLog,
) -> Result<RunStatus, StoreError> {
    let status = log.counters.finished_status();
    let details = format!(
        "Successfully migrated {} {}",
        log.counters.successful,
        log.entity_type.plural()
    );
    store
        .finalize_run(log.run_id, status, &log.counters, log.error_log(), Some(&details))
        .await?;
    tracing::info!(
        run_id = log.run_id,
        entity_type = %log.entity_type,
        status = %status,
        total = log.counters.total,
        successful = log.counters.successful,
        failed = log.counters.failed,
        "Migration run finished"
    );
    Ok(status)
}

/// Close the run as `failed` after a phase-fatal error.
pub async fn fail_run<S: RunStore + ?Sized>(
    store: &S,
    log: &mut RunLog,
    error: &MigrationError,
) -> Result<(), StoreError> {
    append_error_entry(&mut log.error_log, &error.run_log_message());
    store
        .finalize_run(log.run_id, RunStatus::Failed, &log.counters, log.error_log(), None)
        .await?;
    tracing::error!(
        run_id = log.run_id,
        entity_type = %log.entity_type,
        error = %error,
        "Migration run failed"
    );
    Ok(())
}
