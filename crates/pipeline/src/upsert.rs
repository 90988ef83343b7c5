//! Idempotent create-or-update keyed by external id.

use cartshift_core::mapping::MappedRecord;
use cartshift_core::migration::EntityAction;
use cartshift_core::types::DbId;

use crate::error::StoreError;
use crate::store::UpsertRepository;

/// What an upsert did and which record it resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub target: DbId,
    pub action: EntityAction,
}

/// Find the record by external id; update it when `update_existing`,
/// otherwise leave it untouched; create it when absent.
pub async fn upsert<R, S>(repo: &S, record: &R, update_existing: bool) -> Result<UpsertOutcome, StoreError>
where
    R: MappedRecord + Sync,
    S: UpsertRepository<R> + ?Sized,
{
    match repo.find_by_external_id(record.external_id()).await? {
        Some(target) if update_existing => {
            repo.update(target, record).await?;
            Ok(UpsertOutcome {
                target,
                action: EntityAction::Updated,
            })
        }
        Some(target) => Ok(UpsertOutcome {
            target,
            action: EntityAction::Skipped,
        }),
        None => {
            let target = repo.insert(record).await?;
            Ok(UpsertOutcome {
                target,
                action: EntityAction::Created,
            })
        }
    }
}
